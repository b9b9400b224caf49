use std::fmt::{Display, Formatter};
use std::str::FromStr;

use cfgsweep_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

/// Configuration object kinds the sweeper evaluates.
///
/// Variant order is significant: reports are sorted by `(kind, name)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// Core `v1/ConfigMap`.
    ConfigMap,
    /// Core `v1/Secret`.
    Secret,
}

impl ObjectKind {
    /// Returns a stable transport value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigMap => "configmap",
            Self::Secret => "secret",
        }
    }

    /// Returns all known kinds in report order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ObjectKind] = &[ObjectKind::ConfigMap, ObjectKind::Secret];

        ALL
    }
}

impl Display for ObjectKind {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "configmap" => Ok(Self::ConfigMap),
            "secret" => Ok(Self::Secret),
            _ => Err(AppError::Validation(format!(
                "unknown object kind '{value}'"
            ))),
        }
    }
}

/// Identity of one object by kind and name within the run namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    kind: ObjectKind,
    name: NonEmptyString,
}

impl ObjectRef {
    /// Creates a validated object reference.
    pub fn new(kind: ObjectKind, name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            kind,
            name: NonEmptyString::new(name)?,
        })
    }

    /// Returns the referenced kind.
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Returns the referenced object name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl Display for ObjectRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}/{}", self.kind, self.name)
    }
}
