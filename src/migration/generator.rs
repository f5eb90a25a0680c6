//! Migration generator: diff, number, write.

use super::index::MigrationIndex;
use super::types::{
    normalize_description, MigrationAction, MigrationError, MigrationFile, MigrationVersion,
};
use crate::config::ConfigProvider;
use crate::diff::{DiffError, DiffOutcome, DiffProvider, Direction};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Options for generating migrations
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Free text embedded in the file names
    pub description: String,
    /// Write the `do` file
    pub up: bool,
    /// Write the `undo` file
    pub down: bool,
    /// Plan the files without writing them
    pub dry_run: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            description: String::new(),
            up: true,
            down: true,
            dry_run: false,
        }
    }
}

/// A migration file about to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub file: MigrationFile,
    pub content: String,
}

impl PlannedFile {
    fn new(dir: &Path, file: MigrationFile, content: String) -> Self {
        Self {
            path: dir.join(file.filename()),
            file,
            content,
        }
    }
}

/// Result of a generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateOutcome {
    /// The schema and database agree; nothing was written
    NoChanges,
    /// Dry run: the files that would have been written
    Planned(Vec<PlannedFile>),
    /// Paths written, `do` before `undo`
    Written(Vec<PathBuf>),
}

impl GenerateOutcome {
    /// Paths written or planned
    pub fn paths(&self) -> Vec<&Path> {
        match self {
            GenerateOutcome::NoChanges => Vec::new(),
            GenerateOutcome::Planned(files) => files.iter().map(|f| f.path.as_path()).collect(),
            GenerateOutcome::Written(paths) => paths.iter().map(PathBuf::as_path).collect(),
        }
    }
}

/// Generates numbered migration files from schema diffs.
///
/// The generator asks its [`DiffProvider`] for the up (and optionally down)
/// script, short-circuits when there is nothing to migrate, then numbers
/// and writes the files into the directory supplied by its
/// [`ConfigProvider`].
pub struct MigrationGenerator {
    diff: Arc<dyn DiffProvider>,
    config: Arc<dyn ConfigProvider>,
}

impl MigrationGenerator {
    pub fn new(diff: Arc<dyn DiffProvider>, config: Arc<dyn ConfigProvider>) -> Self {
        Self { diff, config }
    }

    /// Generate migration files.
    ///
    /// This method:
    /// 1. Runs the up diff, and the down diff when requested, concurrently
    /// 2. Returns `NoChanges` if the up diff is empty
    /// 3. Resolves and checks the migrations directory
    /// 4. Computes the next version from the files already there
    /// 5. Writes the `do` and `undo` files (or only plans them on a dry run)
    pub async fn generate(
        &self,
        options: &GenerateOptions,
    ) -> Result<GenerateOutcome, MigrationError> {
        if !options.up && !options.down {
            return Err(MigrationError::NothingRequested);
        }

        let description = normalize_description(&options.description)?;

        // The up diff always runs: it decides whether anything changed
        let (up, down) = tokio::try_join!(
            self.diff.diff(Direction::Up),
            self.down_diff(options.down)
        )?;

        if !up.has_changes() {
            info!("No migrations are needed");
            return Ok(GenerateOutcome::NoChanges);
        }

        let migrations_dir = self.config.migrations_dir().await?;
        ensure_directory(&migrations_dir).await?;

        let index = MigrationIndex::load(&migrations_dir).await?;
        let version = index.next_version()?;

        debug!(
            dir = %migrations_dir.display(),
            existing = index.files().len(),
            skipped = index.skipped().len(),
            %version,
            "Computed next migration version"
        );

        let do_file = options.up.then(|| {
            plan_file(
                &migrations_dir,
                version,
                MigrationAction::Do,
                description.as_deref(),
                up,
            )
        });
        let undo_file = down.map(|down| {
            plan_file(
                &migrations_dir,
                version,
                MigrationAction::Undo,
                description.as_deref(),
                down,
            )
        });

        if options.dry_run {
            let planned = do_file.into_iter().chain(undo_file).collect();
            return Ok(GenerateOutcome::Planned(planned));
        }

        let written = write_pair(do_file.as_ref(), undo_file.as_ref()).await?;
        Ok(GenerateOutcome::Written(written))
    }

    async fn down_diff(&self, enabled: bool) -> Result<Option<DiffOutcome>, DiffError> {
        if enabled {
            self.diff.diff(Direction::Down).await.map(Some)
        } else {
            Ok(None)
        }
    }
}

fn plan_file(
    dir: &Path,
    version: MigrationVersion,
    action: MigrationAction,
    description: Option<&str>,
    outcome: DiffOutcome,
) -> PlannedFile {
    let file = MigrationFile::new(version, action, description.map(str::to_string));
    PlannedFile::new(dir, file, outcome.into_script())
}

async fn ensure_directory(dir: &Path) -> Result<(), MigrationError> {
    match fs::metadata(dir).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        Ok(_) => Err(MigrationError::NotADirectory(dir.display().to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(MigrationError::DirectoryNotFound(dir.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Write the do/undo files concurrently.
///
/// If either write fails, the file that did land is removed again.
async fn write_pair(
    do_file: Option<&PlannedFile>,
    undo_file: Option<&PlannedFile>,
) -> Result<Vec<PathBuf>, MigrationError> {
    let (do_result, undo_result) =
        tokio::join!(write_optional(do_file), write_optional(undo_file));

    match (do_result, undo_result) {
        (Ok(do_path), Ok(undo_path)) => Ok(do_path.into_iter().chain(undo_path).collect()),
        (Err(e), other) | (other, Err(e)) => {
            if let Ok(Some(path)) = other {
                error!(path = %path.display(), "Removing migration file after failed write");
                discard(&path).await;
            }
            Err(e)
        }
    }
}

async fn write_optional(planned: Option<&PlannedFile>) -> Result<Option<PathBuf>, MigrationError> {
    match planned {
        Some(planned) => write_migration_file(planned).await.map(Some),
        None => Ok(None),
    }
}

/// Write one migration file via a temp file linked into place.
///
/// An existing file at the target path is never replaced, even one that
/// appears while the temp file is being written.
async fn write_migration_file(planned: &PlannedFile) -> Result<PathBuf, MigrationError> {
    let temp_path = planned.path.with_file_name(format!(
        ".{}.{}.tmp",
        planned.file.filename(),
        Uuid::new_v4()
    ));

    let result = match fs::write(&temp_path, &planned.content).await {
        Ok(()) => link_into_place(&temp_path, &planned.path).await,
        Err(e) => Err(e.into()),
    };
    discard(&temp_path).await;
    result?;

    info!(path = %planned.path.display(), "Wrote migration file");
    Ok(planned.path.clone())
}

/// Hard-link `temp` to `target`; fails instead of replacing `target`
async fn link_into_place(temp: &Path, target: &Path) -> Result<(), MigrationError> {
    match fs::hard_link(temp, target).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Err(MigrationError::AlreadyExists(target.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Remove a file we created, logging when it cannot be removed.
///
/// Returns `true` when the file is gone afterwards.
async fn discard(path: &Path) -> bool {
    match fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to remove file");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_generate_both_directions() {
        let options = GenerateOptions::default();
        assert!(options.up);
        assert!(options.down);
        assert!(!options.dry_run);
        assert!(options.description.is_empty());
    }

    #[test]
    fn test_plan_file_path() {
        let planned = plan_file(
            Path::new("/app/migrations"),
            MigrationVersion::FIRST,
            MigrationAction::Undo,
            Some("add-users"),
            DiffOutcome::Changes("DROP TABLE users;".to_string()),
        );
        assert_eq!(
            planned.path,
            PathBuf::from("/app/migrations/001.undo.add-users.sql")
        );
        assert_eq!(planned.content, "DROP TABLE users;");
    }

    #[tokio::test]
    async fn test_write_migration_file_refuses_to_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let planned = plan_file(
            temp_dir.path(),
            MigrationVersion::FIRST,
            MigrationAction::Do,
            None,
            DiffOutcome::Changes("CREATE TABLE a();".to_string()),
        );
        fs::write(&planned.path, "original").await.unwrap();

        let result = write_migration_file(&planned).await;
        assert!(matches!(result, Err(MigrationError::AlreadyExists(_))));
        assert_eq!(fs::read_to_string(&planned.path).await.unwrap(), "original");
    }

    #[tokio::test]
    async fn test_write_migration_file_leaves_no_temp_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let planned = plan_file(
            temp_dir.path(),
            MigrationVersion::FIRST,
            MigrationAction::Do,
            None,
            DiffOutcome::Changes("CREATE TABLE a();".to_string()),
        );

        let path = write_migration_file(&planned).await.unwrap();
        assert_eq!(fs::read_to_string(&path).await.unwrap(), "CREATE TABLE a();");

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["001.do.sql".to_string()]);
    }

    #[tokio::test]
    async fn test_link_into_place_keeps_target_created_after_planning() {
        let temp_dir = tempfile::tempdir().unwrap();
        let planned = plan_file(
            temp_dir.path(),
            MigrationVersion::FIRST,
            MigrationAction::Do,
            None,
            DiffOutcome::Changes("CREATE TABLE mine();".to_string()),
        );
        let temp_path = temp_dir.path().join(".001.do.sql.tmp");
        fs::write(&temp_path, &planned.content).await.unwrap();

        // Another run lands the same version before the link
        fs::write(&planned.path, "CREATE TABLE theirs();").await.unwrap();

        let result = link_into_place(&temp_path, &planned.path).await;
        assert!(matches!(result, Err(MigrationError::AlreadyExists(_))));
        assert_eq!(
            fs::read_to_string(&planned.path).await.unwrap(),
            "CREATE TABLE theirs();"
        );
    }

    #[tokio::test]
    async fn test_discard() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("leftover.tmp");
        fs::write(&file, "x").await.unwrap();

        assert!(discard(&file).await);
        assert!(!file.exists());
        assert!(discard(&file).await);

        // remove_file refuses directories, so the failure is reported
        let dir = temp_dir.path().join("subdir");
        fs::create_dir(&dir).await.unwrap();
        assert!(!discard(&dir).await);
        assert!(dir.exists());
    }

    #[tokio::test]
    async fn test_write_pair_rolls_back_on_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let do_file = plan_file(
            temp_dir.path(),
            MigrationVersion::FIRST,
            MigrationAction::Do,
            None,
            DiffOutcome::Changes("CREATE TABLE a();".to_string()),
        );
        let undo_file = plan_file(
            temp_dir.path(),
            MigrationVersion::FIRST,
            MigrationAction::Undo,
            None,
            DiffOutcome::Changes("DROP TABLE a;".to_string()),
        );
        fs::write(&undo_file.path, "taken").await.unwrap();

        let result = write_pair(Some(&do_file), Some(&undo_file)).await;
        assert!(matches!(result, Err(MigrationError::AlreadyExists(_))));
        assert!(!do_file.path.exists());
        assert_eq!(fs::read_to_string(&undo_file.path).await.unwrap(), "taken");
    }
}
