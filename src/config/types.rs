use serde::{Deserialize, Serialize};

/// The `migrations` section of a Platformatic DB configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MigrationsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    /// Bookkeeping table used by the migrator; informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

/// Subset of a Platformatic configuration file.
///
/// Unknown keys (`server`, `db`, `plugins`, ...) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformaticConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationsConfig>,
}

impl PlatformaticConfig {
    /// The configured migrations directory, if present and non-empty
    pub fn migrations_dir(&self) -> Option<&str> {
        self.migrations
            .as_ref()
            .and_then(|m| m.dir.as_deref())
            .map(str::trim)
            .filter(|dir| !dir.is_empty())
    }
}
