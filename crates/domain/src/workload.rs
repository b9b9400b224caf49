use std::collections::BTreeSet;

use cfgsweep_core::{AppResult, Namespace, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::ObjectRef;

/// One pod snapshot and the configuration objects its spec depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    name: NonEmptyString,
    namespace: Namespace,
    spec_references: BTreeSet<ObjectRef>,
}

impl Workload {
    /// Creates a validated workload snapshot.
    pub fn new(
        name: impl Into<String>,
        namespace: Namespace,
        spec_references: impl IntoIterator<Item = ObjectRef>,
    ) -> AppResult<Self> {
        Ok(Self {
            name: NonEmptyString::new(name)?,
            namespace,
            spec_references: spec_references.into_iter().collect(),
        })
    }

    /// Returns the pod name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the pod namespace.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns every declared `(kind, name)` dependency.
    #[must_use]
    pub fn spec_references(&self) -> &BTreeSet<ObjectRef> {
        &self.spec_references
    }

    /// Returns true when the spec declares an exact dependency on `object`.
    #[must_use]
    pub fn references(&self, object: &ObjectRef) -> bool {
        self.spec_references.contains(object)
    }
}
