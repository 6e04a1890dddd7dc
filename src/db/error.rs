//! Storage error type shared by every [`GameStore`](super::GameStore).

use derive_more::{Display, Error};
use tracing::instrument;

/// Storage failure with the source location that raised it.
#[derive(Debug, Clone, Display, Error)]
#[display("Storage error: {} at {}:{}", message, file, line)]
pub struct DbError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl DbError {
    /// Creates a new storage error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// The store refused `operation` outright.
    #[track_caller]
    pub fn unavailable(operation: &str) -> Self {
        Self::new(format!("Store unavailable during {}", operation))
    }

    /// A stored column holds a value the domain cannot represent.
    #[track_caller]
    pub fn corrupt(column: &str, value: impl std::fmt::Display) -> Self {
        Self::new(format!("Invalid {} value in storage: '{}'", column, value))
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(format!("Diesel error: {}", err))
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("Connection error: {}", err))
    }
}
