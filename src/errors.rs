use std::result::Result as StdResult;

use thiserror::Error;

use crate::ledger::Money;

/// Precondition and validation failures raised by the pure calculators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(
        "Extra fee of {deficit} must be fully distributed; {distributed} assigned, {remaining} remaining",
        remaining = .deficit - .distributed
    )]
    IncompleteDistribution { deficit: Money, distributed: Money },
}

impl LedgerError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        LedgerError::InvalidArgument(message.into())
    }
}

/// Unified error type for service, storage, and configuration layers.
#[derive(Debug, Error)]
pub enum DuebookError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("Business not found: {0}")]
    BusinessNotFound(String),
    #[error("Persistence error: {0}")]
    StorageError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = StdResult<T, DuebookError>;

/// Failures that end or interrupt the command shell.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] DuebookError),
    #[error("Invalid input: {0}")]
    Input(String),
    #[error("Command failed: {0}")]
    Command(String),
}

impl From<std::io::Error> for DuebookError {
    fn from(err: std::io::Error) -> Self {
        DuebookError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for DuebookError {
    fn from(err: serde_json::Error) -> Self {
        DuebookError::StorageError(err.to_string())
    }
}

impl From<crate::core::services::ServiceError> for DuebookError {
    fn from(err: crate::core::services::ServiceError) -> Self {
        use crate::core::services::ServiceError;
        match err {
            ServiceError::Ledger(inner) => DuebookError::Ledger(inner),
            ServiceError::NotFound(message) | ServiceError::Invalid(message) => {
                DuebookError::InvalidInput(message)
            }
        }
    }
}
