//! Index of the migration files already present in a directory.

use super::types::{MigrationError, MigrationFile, MigrationVersion};
use crate::utils::has_migration_extension;
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// Migration files found in a migrations directory
#[derive(Debug, Clone, Default)]
pub struct MigrationIndex {
    /// Every `.sql` file with a numeric prefix, sorted by name
    versioned: Vec<(MigrationVersion, String)>,
    /// Fully recognised `<version>.<do|undo>.[<description>.]sql` files
    files: Vec<MigrationFile>,
    /// `.sql` files whose prefix is not a version
    skipped: Vec<String>,
}

impl MigrationIndex {
    /// Build an index from a directory listing.
    ///
    /// Fails with `InvalidVersion` when a numeric prefix does not fit a
    /// version, since skipping it could hand out a number already in use.
    pub fn from_filenames<I, S>(file_names: I) -> Result<Self, MigrationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: Vec<String> = file_names
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .filter(|name| has_migration_extension(name))
            .collect();
        names.sort();

        let mut index = Self::default();

        for name in names {
            match MigrationVersion::from_filename(&name)? {
                Some(version) => {
                    if let Ok(file) = MigrationFile::parse_filename(&name) {
                        index.files.push(file);
                    }
                    index.versioned.push((version, name));
                }
                None => {
                    warn!(file = %name, "Skipping SQL file without a numeric version prefix");
                    index.skipped.push(name);
                }
            }
        }

        index
            .files
            .sort_by(|a, b| (a.version, a.action).cmp(&(b.version, b.action)));

        Ok(index)
    }

    /// Read the file names in `dir` and index them
    pub async fn load(dir: &Path) -> Result<Self, MigrationError> {
        let mut file_names = Vec::new();

        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                file_names.push(name.to_string());
            }
        }

        Self::from_filenames(file_names)
    }

    pub fn files(&self) -> &[MigrationFile] {
        &self.files
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.versioned.is_empty()
    }

    /// Highest version present.
    ///
    /// Compared numerically, so the answer stays right once versions outgrow
    /// the padding width and lexicographic order stops matching.
    pub fn latest(&self) -> Option<MigrationVersion> {
        self.versioned.iter().map(|(version, _)| *version).max()
    }

    /// Version for the next migration; `001` for an empty directory
    pub fn next_version(&self) -> Result<MigrationVersion, MigrationError> {
        match self.latest() {
            Some(latest) => latest.next(),
            None => Ok(MigrationVersion::FIRST),
        }
    }
}

/// Compute the next migration version from a directory listing
pub fn compute_next_version<I, S>(file_names: I) -> Result<MigrationVersion, MigrationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    MigrationIndex::from_filenames(file_names)?.next_version()
}
