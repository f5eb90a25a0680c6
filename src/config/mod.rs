//! Project configuration lookup.
//!
//! The migrations directory is the only value the generator needs from the
//! project. It normally comes from the `migrations.dir` key of a Platformatic
//! DB configuration file, but any [`ConfigProvider`] can supply it.

mod types;

pub use types::{MigrationsConfig, PlatformaticConfig};

use crate::utils::resolve_path;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::debug;

/// Configuration file names, in lookup order
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "platformatic.db.json",
    "platformatic.db.yaml",
    "platformatic.db.yml",
    "platformatic.db.toml",
    "platformatic.json",
    "platformatic.yaml",
    "platformatic.yml",
    "platformatic.toml",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("No Platformatic configuration file found in {0}")]
    NotFound(String),

    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("Missing `migrations.dir` in {0}")]
    MissingMigrationsDir(String),
}

/// Source of the migrations directory.
///
/// Queried once at the start of a generation run.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    async fn migrations_dir(&self) -> Result<PathBuf, ConfigError>;
}

/// A fixed migrations directory, e.g. from the command line
#[derive(Debug, Clone)]
pub struct StaticConfig {
    migrations_dir: PathBuf,
}

impl StaticConfig {
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
        }
    }
}

#[async_trait]
impl ConfigProvider for StaticConfig {
    async fn migrations_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.migrations_dir.clone())
    }
}

/// Migrations directory read from the project's Platformatic configuration
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    project_path: PathBuf,
    config_path: Option<PathBuf>,
}

impl ProjectConfig {
    /// Discover the configuration file inside `project_path`
    pub fn new(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            config_path: None,
        }
    }

    /// Use an explicit configuration file instead of discovering one.
    /// Relative paths are resolved against the project path.
    pub fn with_config_file(mut self, config_path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(config_path.into());
        self
    }

    async fn config_file(&self) -> Result<PathBuf, ConfigError> {
        match &self.config_path {
            Some(path) => Ok(resolve_path(&self.project_path, path)),
            None => find_config_file(&self.project_path)
                .await
                .ok_or_else(|| ConfigError::NotFound(self.project_path.display().to_string())),
        }
    }
}

#[async_trait]
impl ConfigProvider for ProjectConfig {
    async fn migrations_dir(&self) -> Result<PathBuf, ConfigError> {
        let config_file = self.config_file().await?;
        let config = read_config(&config_file).await?;

        let dir = config
            .migrations_dir()
            .ok_or_else(|| ConfigError::MissingMigrationsDir(config_file.display().to_string()))?;

        // Platformatic resolves paths relative to the file that declares them
        let base = config_file.parent().unwrap_or(self.project_path.as_path());
        let migrations_dir = resolve_path(base, dir);

        debug!(
            config = %config_file.display(),
            migrations_dir = %migrations_dir.display(),
            "Resolved migrations directory"
        );

        Ok(migrations_dir)
    }
}

/// Find the first known configuration file in the project directory
pub async fn find_config_file(project_path: &Path) -> Option<PathBuf> {
    for name in CONFIG_FILE_NAMES {
        let candidate = project_path.join(name);
        if fs::metadata(&candidate)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            return Some(candidate);
        }
    }
    None
}

/// Read a configuration file, choosing the parser by extension
pub async fn read_config(config_path: &Path) -> Result<PlatformaticConfig, ConfigError> {
    let extension = config_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let content = fs::read_to_string(config_path).await?;

    let config: PlatformaticConfig = match extension.as_str() {
        "json" => serde_json::from_str(&content)?,
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        "toml" => toml::from_str(&content)?,
        _ => {
            return Err(ConfigError::UnsupportedFormat(
                config_path.display().to_string(),
            ))
        }
    };

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_config() {
        let provider = StaticConfig::new("/srv/migrations");
        let dir = provider.migrations_dir().await.unwrap();
        assert_eq!(dir, PathBuf::from("/srv/migrations"));
    }

    #[tokio::test]
    async fn test_read_config_rejects_unknown_extension() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("platformatic.ini");
        fs::write(&path, "dir = migrations").await.unwrap();

        let result = read_config(&path).await;
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_find_config_file_prefers_db_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("platformatic.json"), "{}")
            .await
            .unwrap();
        fs::write(temp_dir.path().join("platformatic.db.yaml"), "{}")
            .await
            .unwrap();

        let found = find_config_file(temp_dir.path()).await.unwrap();
        assert!(found.ends_with("platformatic.db.yaml"));
    }

    #[tokio::test]
    async fn test_find_config_file_none() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(find_config_file(temp_dir.path()).await.is_none());
    }
}
