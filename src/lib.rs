pub mod config;
pub mod diff;
pub mod migration;
pub mod utils;

// Re-export commonly used types
pub use config::{ConfigError, ConfigProvider, PlatformaticConfig, ProjectConfig, StaticConfig};
pub use diff::{DiffError, DiffOutcome, DiffProvider, Direction, PrismaDiff};
pub use migration::{
    build_filename, compute_next_version, GenerateOptions, GenerateOutcome, MigrationAction,
    MigrationError, MigrationFile, MigrationGenerator, MigrationIndex, MigrationVersion,
    PlannedFile,
};
