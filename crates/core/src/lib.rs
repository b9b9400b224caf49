//! Shared primitives for all Rust crates in cfgsweep.

#![forbid(unsafe_code)]

/// Kubernetes namespace primitives shared across crates.
pub mod namespace;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use namespace::Namespace;

/// Result type used across cfgsweep crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl std::fmt::Display for NonEmptyString {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid flags, credentials, or kubeconfig.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Control-plane read failed; snapshot is incomplete.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Control-plane write failed for one object.
    #[error("deletion error: {0}")]
    Deletion(String),

    /// Requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write precondition did not hold against current cluster state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Run deadline elapsed before the operation completed.
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns true when the error was raised before any cluster call was made.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Validation(_))
    }
}
