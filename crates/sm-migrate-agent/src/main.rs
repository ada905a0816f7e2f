//! # sm-migrate
//!
//! Usage: `sm-migrate [ENV_FILE]` (defaults to `env.txt`).

use sm_migrate_agent::{MigrateConfig, MigrateError, MigrationReport, Migrator, DEFAULT_ENV_FILE};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting sm-migrate");

    let env_file = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_ENV_FILE), PathBuf::from);

    match run(&env_file).await {
        Ok(report) => {
            println!("\n--- Summary ---");
            println!("{}", report.summary);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Migration aborted");
            eprintln!("error: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(env_file: &Path) -> Result<MigrationReport, MigrateError> {
    let config = MigrateConfig::from_env_file(env_file)?;
    let migrator = Migrator::new(config)?;
    migrator.run().await
}
