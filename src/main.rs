use anyhow::Context;
use clap::{ArgAction, Parser};
use colored::Colorize;
use migration_generator::config::{ConfigProvider, ProjectConfig, StaticConfig};
use migration_generator::diff::{split_command, PrismaDiff};
use migration_generator::migration::{GenerateOptions, GenerateOutcome, MigrationGenerator};
use migration_generator::utils::{resolve_path, DEFAULT_PRISMA_COMMAND, DEFAULT_SCHEMA_PATH};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Generate numbered do/undo SQL migrations from the Prisma schema diff
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Description embedded in the migration file names
    #[arg(value_name = "DESCRIPTION", conflicts_with = "description")]
    positional_description: Option<String>,

    /// Description embedded in the migration file names
    #[arg(short, long)]
    description: Option<String>,

    /// Generate the "do" migration
    #[arg(long, action = ArgAction::Set, default_value_t = true, num_args = 0..=1, default_missing_value = "true")]
    up: bool,

    /// Generate the "undo" migration
    #[arg(long, action = ArgAction::Set, default_value_t = true, num_args = 0..=1, default_missing_value = "true")]
    down: bool,

    /// Path to the Prisma schema
    #[arg(short, long, env = "PRISMA_SCHEMA", default_value = DEFAULT_SCHEMA_PATH)]
    schema: PathBuf,

    /// Platformatic configuration file (discovered in the working directory by default)
    #[arg(short, long, env = "PLATFORMATIC_CONFIG")]
    config: Option<PathBuf>,

    /// Migrations directory, overriding the configuration file
    #[arg(long, env = "MIGRATIONS_DIR")]
    migrations_dir: Option<PathBuf>,

    /// Command used to run Prisma
    #[arg(long, env = "PRISMA_COMMAND", default_value = DEFAULT_PRISMA_COMMAND)]
    prisma: String,

    /// Show the files that would be generated without writing them
    #[arg(long)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", format!("{:#}", e).red());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    init_logging(args.verbose)?;

    let cwd = std::env::current_dir().context("Failed to read the working directory")?;

    let diff = PrismaDiff::new(resolve_path(&cwd, &args.schema))
        .with_command(split_command(&args.prisma));

    let config: Arc<dyn ConfigProvider> = match (args.migrations_dir, args.config) {
        (Some(dir), _) => Arc::new(StaticConfig::new(resolve_path(&cwd, dir))),
        (None, Some(file)) => Arc::new(ProjectConfig::new(cwd.clone()).with_config_file(file)),
        (None, None) => Arc::new(ProjectConfig::new(cwd.clone())),
    };

    let options = GenerateOptions {
        description: args
            .description
            .or(args.positional_description)
            .unwrap_or_default(),
        up: args.up,
        down: args.down,
        dry_run: args.dry_run,
    };

    debug!(schema = %diff.schema_path().display(), ?options, "Generating migrations");

    let generator = MigrationGenerator::new(Arc::new(diff), config);
    let outcome = generator.generate(&options).await?;

    report(&outcome);
    Ok(())
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Logs go to stderr; stdout carries the report
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn report(outcome: &GenerateOutcome) {
    match outcome {
        GenerateOutcome::NoChanges => {
            println!("{}", "No migrations are needed".green());
        }
        GenerateOutcome::Planned(files) => {
            println!("{}", "Would generate migration files:".yellow());
            for file in files {
                println!("\t{}", file.path.display().to_string().underline());
                for line in file.content.lines() {
                    println!("\t  {}", line.dimmed());
                }
            }
        }
        GenerateOutcome::Written(paths) => {
            println!("{}", "Generated migration files:".green());
            for path in paths {
                println!("\t{}", path.display().to_string().underline());
            }
        }
    }
}
