//! Migration file generation.
//!
//! This module numbers and writes Postgrator-style SQL migration files.
//!
//! # Overview
//!
//! - Files are named `<version>.<do|undo>.[<description>.]sql`, with the
//!   version zero-padded to three digits
//! - The `MigrationIndex` reads the migrations directory and works out the
//!   next version (`001` for an empty directory)
//! - The `MigrationGenerator` asks a diff provider for the up/down scripts
//!   and writes one `do` and one `undo` file per version
//! - An empty up diff writes nothing and is reported as `NoChanges`
//!
//! # Usage
//!
//! ```ignore
//! let generator = MigrationGenerator::new(diff, config);
//! let outcome = generator.generate(&GenerateOptions::default()).await?;
//! ```

mod generator;
mod index;
mod types;

pub use generator::{GenerateOptions, GenerateOutcome, MigrationGenerator, PlannedFile};
pub use index::{compute_next_version, MigrationIndex};
pub use types::{
    build_filename, normalize_description, MigrationAction, MigrationError, MigrationFile,
    MigrationVersion,
};
