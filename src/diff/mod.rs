//! Schema diff providers.
//!
//! A [`DiffProvider`] turns a [`Direction`] into migration SQL. The default
//! provider shells out to `prisma migrate diff`, comparing the declared
//! datamodel with the live datasource.

mod prisma;
mod types;

pub use prisma::{split_command, PrismaDiff};
pub use types::{DiffOutcome, Direction};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema diff ({direction}) failed with {}: {stderr}", exit_code_label(.code))]
    Failed {
        direction: Direction,
        /// `None` when the process was killed by a signal
        code: Option<i32>,
        stderr: String,
    },

    #[error("Diff command is empty")]
    EmptyCommand,
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

/// Produces migration SQL for one direction
#[async_trait]
pub trait DiffProvider: Send + Sync {
    async fn diff(&self, direction: Direction) -> Result<DiffOutcome, DiffError>;
}
