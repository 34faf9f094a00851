use sbv_rate_core::{CoreError, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Core(CoreError::Validation(_)) => 2,
            Self::Core(CoreError::MissingDependency { .. }) => 4,
            Self::Core(CoreError::Serialization(_)) => 10,
            Self::Serialization(_) => 10,
            Self::Io(_) => 10,
        }
    }
}
