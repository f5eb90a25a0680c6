use super::types::{DiffOutcome, Direction};
use super::{DiffError, DiffProvider};
use crate::utils::DEFAULT_PRISMA_COMMAND;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Diff provider backed by `prisma migrate diff`
#[derive(Debug, Clone)]
pub struct PrismaDiff {
    command: Vec<String>,
    schema_path: PathBuf,
}

impl PrismaDiff {
    pub fn new(schema_path: impl Into<PathBuf>) -> Self {
        Self {
            command: split_command(DEFAULT_PRISMA_COMMAND),
            schema_path: schema_path.into(),
        }
    }

    /// Replace the program (and leading arguments) used to invoke Prisma
    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    /// Arguments passed after the Prisma command for a direction
    pub fn arguments(&self, direction: Direction) -> Vec<String> {
        let schema = self.schema_path.display().to_string();
        let (from, to) = match direction {
            Direction::Up => ("--from-schema-datasource", "--to-schema-datamodel"),
            Direction::Down => ("--from-schema-datamodel", "--to-schema-datasource"),
        };

        vec![
            "migrate".to_string(),
            "diff".to_string(),
            from.to_string(),
            schema.clone(),
            to.to_string(),
            schema,
            "--script".to_string(),
        ]
    }
}

#[async_trait]
impl DiffProvider for PrismaDiff {
    async fn diff(&self, direction: Direction) -> Result<DiffOutcome, DiffError> {
        let (program, leading_args) = self.command.split_first().ok_or(DiffError::EmptyCommand)?;
        let args = self.arguments(direction);

        debug!(%direction, program = %program, args = ?args, "Running schema diff");

        let output = Command::new(program)
            .args(leading_args)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| DiffError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DiffError::Failed {
                direction,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let outcome = DiffOutcome::from_script(&stdout);

        debug!(%direction, changes = outcome.has_changes(), "Schema diff finished");

        Ok(outcome)
    }
}

/// Split a command line on whitespace, e.g. `"npx prisma"`
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}
