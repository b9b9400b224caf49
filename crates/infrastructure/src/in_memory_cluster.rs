use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use cfgsweep_application::{ClusterReader, ClusterWriter, DeleteMode};
use cfgsweep_core::{AppError, AppResult, Namespace};
use cfgsweep_domain::{Candidate, ObjectKind, Workload};
use tokio::sync::RwLock;

type ObjectKey = (String, ObjectKind, String);

/// In-memory cluster implementation of both cluster ports.
#[derive(Debug, Default)]
pub struct InMemoryCluster {
    objects: RwLock<BTreeMap<ObjectKey, Candidate>>,
    workloads: RwLock<Vec<Workload>>,
    unreadable_kinds: RwLock<BTreeSet<ObjectKind>>,
    rejected_deletes: RwLock<BTreeSet<String>>,
}

impl InMemoryCluster {
    /// Creates an empty cluster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores one object, replacing any object with the same identity.
    pub async fn insert_candidate(&self, candidate: Candidate) {
        let key = key_for(&candidate);
        self.objects.write().await.insert(key, candidate);
    }

    /// Stores one workload snapshot.
    pub async fn insert_workload(&self, workload: Workload) {
        self.workloads.write().await.push(workload);
    }

    /// Makes every subsequent list of `kind` fail.
    pub async fn fail_listing(&self, kind: ObjectKind) {
        self.unreadable_kinds.write().await.insert(kind);
    }

    /// Makes every subsequent delete of objects named `name` fail.
    pub async fn reject_delete(&self, name: impl Into<String>) {
        self.rejected_deletes.write().await.insert(name.into());
    }

    /// Returns true when the object still exists.
    pub async fn contains(&self, namespace: &Namespace, kind: ObjectKind, name: &str) -> bool {
        self.objects.read().await.contains_key(&(
            namespace.as_str().to_owned(),
            kind,
            name.to_owned(),
        ))
    }
}

#[async_trait]
impl ClusterReader for InMemoryCluster {
    async fn list_candidates(
        &self,
        namespace: &Namespace,
        kind: ObjectKind,
    ) -> AppResult<Vec<Candidate>> {
        if self.unreadable_kinds.read().await.contains(&kind) {
            return Err(AppError::Fetch(format!(
                "failed to list {kind} in namespace '{namespace}': connection refused"
            )));
        }

        Ok(self
            .objects
            .read()
            .await
            .values()
            .filter(|candidate| candidate.kind() == kind && candidate.namespace() == namespace)
            .cloned()
            .collect())
    }

    async fn list_workloads(&self, namespace: &Namespace) -> AppResult<Vec<Workload>> {
        Ok(self
            .workloads
            .read()
            .await
            .iter()
            .filter(|workload| workload.namespace() == namespace)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ClusterWriter for InMemoryCluster {
    async fn delete(&self, candidate: &Candidate, mode: DeleteMode) -> AppResult<()> {
        if self.rejected_deletes.read().await.contains(candidate.name()) {
            return Err(AppError::Deletion(format!(
                "delete of {} '{}' was rejected",
                candidate.kind(),
                candidate.name()
            )));
        }

        let key = key_for(candidate);
        let mut objects = self.objects.write().await;
        let stored = objects.get(&key).ok_or_else(|| {
            AppError::NotFound(format!(
                "{} '{}' no longer exists",
                candidate.kind(),
                candidate.name()
            ))
        })?;

        if stored.uid() != candidate.uid() {
            return Err(AppError::Conflict(format!(
                "{} '{}' was replaced since it was listed",
                candidate.kind(),
                candidate.name()
            )));
        }

        if mode == DeleteMode::Commit {
            objects.remove(&key);
        }

        Ok(())
    }
}

fn key_for(candidate: &Candidate) -> ObjectKey {
    (
        candidate.namespace().as_str().to_owned(),
        candidate.kind(),
        candidate.name().to_owned(),
    )
}
