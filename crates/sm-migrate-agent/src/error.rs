//! Fatal run errors and their process exit codes.

use crate::config::ConfigError;
use sm_migrate_adapter_aas::{AuthError, ClientError};

/// Errors that abort a run before a summary is produced.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Token could not be obtained
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// HTTP client could not be created
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl MigrateError {
    /// Process exit code for this error. Success is 0.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Auth(_) => 3,
            Self::Client(_) => 4,
        }
    }
}
