//! Types for migration files.

use crate::config::ConfigError;
use crate::diff::{DiffError, Direction};
use crate::utils::{MIGRATION_EXTENSION, VERSION_WIDTH};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// `<version>.<do|undo>.[<description>.]sql`
static MIGRATION_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)\.(do|undo)\.(?:(.+)\.)?sql$").expect("migration filename pattern is valid")
});

/// Error types for migration generation.
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ConfigError(#[from] ConfigError),

    #[error("{0}")]
    DiffError(#[from] DiffError),

    #[error("Migrations directory does not exist: {0}")]
    DirectoryNotFound(String),

    #[error("Migrations path is not a directory: {0}")]
    NotADirectory(String),

    #[error("Migration file already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid migration description '{0}': must not contain path separators")]
    InvalidDescription(String),

    #[error("Invalid migration version: {0}")]
    InvalidVersion(String),

    #[error("Invalid migration action '{0}': expected `do` or `undo`")]
    InvalidAction(String),

    #[error("Migration file name '{0}' does not match <version>.<do|undo>.[<description>.]sql")]
    InvalidFilename(String),

    #[error("Migration version overflow after {0}")]
    VersionOverflow(MigrationVersion),

    #[error("Nothing to generate: both up and down migrations are disabled")]
    NothingRequested,
}

/// Positive migration version number, rendered zero-padded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MigrationVersion(u64);

impl MigrationVersion {
    pub const FIRST: MigrationVersion = MigrationVersion(1);

    /// `None` for zero
    pub fn new(number: u64) -> Option<Self> {
        (number > 0).then_some(Self(number))
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Result<Self, MigrationError> {
        self.0
            .checked_add(1)
            .map(Self)
            .ok_or(MigrationError::VersionOverflow(self))
    }

    /// Version encoded in the first dot-separated segment of a file name.
    ///
    /// `Ok(None)` when the segment is not a positive number. A digit prefix
    /// too large to represent is an error rather than a skipped file.
    pub fn from_filename(file_name: &str) -> Result<Option<Self>, MigrationError> {
        let prefix = file_name.split('.').next().unwrap_or_default();
        if !is_digits(prefix) {
            return Ok(None);
        }

        let number: u64 = prefix
            .parse()
            .map_err(|_| MigrationError::InvalidVersion(file_name.to_string()))?;
        Ok(Self::new(number))
    }
}

impl fmt::Display for MigrationVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = VERSION_WIDTH)
    }
}

impl FromStr for MigrationVersion {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_digits(s) {
            return Err(MigrationError::InvalidVersion(s.to_string()));
        }

        s.parse::<u64>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| MigrationError::InvalidVersion(s.to_string()))
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Action segment of a migration file name
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MigrationAction {
    Do,
    Undo,
}

impl MigrationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationAction::Do => "do",
            MigrationAction::Undo => "undo",
        }
    }
}

impl From<Direction> for MigrationAction {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => MigrationAction::Do,
            Direction::Down => MigrationAction::Undo,
        }
    }
}

impl fmt::Display for MigrationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MigrationAction {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "do" => Ok(MigrationAction::Do),
            "undo" => Ok(MigrationAction::Undo),
            other => Err(MigrationError::InvalidAction(other.to_string())),
        }
    }
}

/// A migration file name, split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub version: MigrationVersion,
    pub action: MigrationAction,
    pub description: Option<String>,
}

impl MigrationFile {
    pub fn new(
        version: MigrationVersion,
        action: MigrationAction,
        description: Option<String>,
    ) -> Self {
        Self {
            version,
            action,
            description,
        }
    }

    /// Render the file name, e.g. `003.undo.add-users.sql`
    pub fn filename(&self) -> String {
        build_filename(
            self.version,
            self.action,
            self.description.as_deref().unwrap_or_default(),
        )
    }

    /// Parse a file name such as `001.do.create-users.sql`
    pub fn parse_filename(file_name: &str) -> Result<Self, MigrationError> {
        let caps = MIGRATION_FILENAME
            .captures(file_name)
            .ok_or_else(|| MigrationError::InvalidFilename(file_name.to_string()))?;

        let version: MigrationVersion = caps[1].parse()?;
        let action: MigrationAction = caps[2].parse()?;
        let description = caps.get(3).map(|m| m.as_str().to_string());

        Ok(Self::new(version, action, description))
    }
}

/// Build a migration file name.
///
/// The description is appended with a trailing dot only when non-empty.
pub fn build_filename(
    version: MigrationVersion,
    action: MigrationAction,
    description: &str,
) -> String {
    let description = if description.is_empty() {
        String::new()
    } else {
        format!("{}.", description)
    };

    format!(
        "{}.{}.{}{}",
        version,
        action.as_str(),
        description,
        MIGRATION_EXTENSION
    )
}

/// Trim a user supplied description; `None` when blank.
pub fn normalize_description(description: &str) -> Result<Option<String>, MigrationError> {
    let trimmed = description.trim();

    if trimmed.contains(['/', '\\', '\0']) {
        return Err(MigrationError::InvalidDescription(description.to_string()));
    }

    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
