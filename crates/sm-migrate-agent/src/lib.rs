//! # sm-migrate Agent
//!
//! Migrates submodels from a source API to a destination API and registers
//! the migrated assets in a digital twin registry.
//!
//! ## Flow
//!
//! 1. **Config**: env file, process environment and defaults merged once
//! 2. **Auth**: one OAuth2 client-credentials token per run (skipped in dry-run)
//! 3. **Fetch**: `GET {source}/{encoded-urn}` for every asset × submodel suffix
//! 4. **Publish**: `POST {dest}`; 409 counts as already present
//! 5. **Register**: one shell descriptor per asset listing its present submodels
//!
//! Calls are awaited one at a time; there is no parallelism and no retry.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod runtime;

pub use config::{EnvFile, MigrateConfig, PublishMode, DEFAULT_ENV_FILE};
pub use error::MigrateError;
pub use runtime::{MigrationReport, Migrator};
