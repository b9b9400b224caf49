use async_trait::async_trait;
use cfgsweep_core::{AppResult, Namespace};
use cfgsweep_domain::{Candidate, ObjectKind, Workload};

/// How a delete request is submitted to the control plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// Delete is committed.
    Commit,
    /// Delete passes admission but nothing is persisted.
    ValidateOnly,
}

impl DeleteMode {
    /// Maps the dry-run flag onto a delete mode.
    #[must_use]
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            Self::ValidateOnly
        } else {
            Self::Commit
        }
    }

    /// Returns true when no mutation is committed.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::ValidateOnly)
    }
}

/// Read port for point-in-time snapshots of cluster objects.
///
/// Implementations do not retry; any failure is reported as
/// [`cfgsweep_core::AppError::Fetch`].
#[async_trait]
pub trait ClusterReader: Send + Sync {
    /// Lists every candidate of one kind in a namespace.
    async fn list_candidates(
        &self,
        namespace: &Namespace,
        kind: ObjectKind,
    ) -> AppResult<Vec<Candidate>>;

    /// Lists every workload in a namespace.
    async fn list_workloads(&self, namespace: &Namespace) -> AppResult<Vec<Workload>>;
}

/// Write port for removing candidates.
#[async_trait]
pub trait ClusterWriter: Send + Sync {
    /// Deletes one candidate by name in its namespace.
    ///
    /// Returns `NotFound` when the object is already gone and `Conflict`
    /// when it no longer matches the snapshot the candidate was taken from.
    async fn delete(&self, candidate: &Candidate, mode: DeleteMode) -> AppResult<()>;
}
