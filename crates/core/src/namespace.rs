use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, AppResult};

const MAX_NAMESPACE_LENGTH: usize = 63;

/// Namespace that scopes every list and delete issued in one run.
///
/// Values follow the RFC 1123 label rules the API server enforces for
/// namespace names, so a typo fails at startup instead of as a fetch error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace(String);

impl Namespace {
    /// Creates a validated namespace.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();

        if value.is_empty() || value.len() > MAX_NAMESPACE_LENGTH {
            return Err(AppError::Validation(format!(
                "namespace '{value}' must be between 1 and {MAX_NAMESPACE_LENGTH} characters"
            )));
        }

        let valid_chars = value.chars().all(|character| {
            character.is_ascii_lowercase() || character.is_ascii_digit() || character == '-'
        });
        let valid_edges = !value.starts_with('-') && !value.ends_with('-');

        if !valid_chars || !valid_edges {
            return Err(AppError::Validation(format!(
                "namespace '{value}' must consist of lowercase alphanumerics or '-' and start and end with an alphanumeric"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the namespace as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self("default".to_owned())
    }
}

impl Display for Namespace {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}
