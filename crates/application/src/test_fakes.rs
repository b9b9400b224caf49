use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use cfgsweep_core::{AppError, AppResult, Namespace};
use cfgsweep_domain::{Candidate, CandidateInput, ObjectKind, ObjectRef, Workload};
use tokio::sync::Mutex;

use crate::{ClusterReader, ClusterWriter, DeleteMode};

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(|| unreachable!())
}

pub(crate) fn aged(kind: ObjectKind, name: &str, age_days: i64) -> Candidate {
    Candidate::new(CandidateInput {
        kind,
        name: name.to_owned(),
        namespace: Namespace::default(),
        uid: Some(format!("uid-{name}")),
        resource_version: Some("1".to_owned()),
        creation_time: fixed_now() - TimeDelta::days(age_days),
        retain: None,
    })
    .unwrap_or_else(|_| unreachable!())
}

pub(crate) fn pod(name: &str, references: &[(ObjectKind, &str)]) -> Workload {
    let references = references
        .iter()
        .map(|(kind, name)| ObjectRef::new(*kind, *name).unwrap_or_else(|_| unreachable!()));
    Workload::new(name, Namespace::default(), references).unwrap_or_else(|_| unreachable!())
}

/// Which list call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailingList {
    Kind(ObjectKind),
    Workloads,
}

#[derive(Default)]
pub(crate) struct FakeCluster {
    pub candidates: Mutex<HashMap<ObjectKind, Vec<Candidate>>>,
    pub workloads: Mutex<Vec<Workload>>,
    pub failing_list: Option<FailingList>,
    pub list_delay: Duration,
    pub delete_delay: Duration,
    pub failing_deletes: BTreeSet<String>,
    pub missing_deletes: BTreeSet<String>,
    pub conflicting_deletes: BTreeSet<String>,
    pub list_calls: Mutex<Vec<String>>,
    pub delete_calls: Mutex<Vec<(ObjectRef, DeleteMode)>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeCluster {
    pub(crate) async fn seed(&self, candidates: Vec<Candidate>, workloads: Vec<Workload>) {
        let mut stored = self.candidates.lock().await;
        for candidate in candidates {
            stored.entry(candidate.kind()).or_default().push(candidate);
        }
        *self.workloads.lock().await = workloads;
    }

    pub(crate) async fn remaining(&self, kind: ObjectKind) -> Vec<String> {
        self.candidates
            .lock()
            .await
            .get(&kind)
            .map(|candidates| {
                candidates
                    .iter()
                    .map(|candidate| candidate.name().to_owned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ClusterReader for FakeCluster {
    async fn list_candidates(
        &self,
        _namespace: &Namespace,
        kind: ObjectKind,
    ) -> AppResult<Vec<Candidate>> {
        self.list_calls.lock().await.push(kind.as_str().to_owned());
        tokio::time::sleep(self.list_delay).await;

        if self.failing_list == Some(FailingList::Kind(kind)) {
            return Err(AppError::Fetch(format!("failed to list {kind}s")));
        }

        Ok(self
            .candidates
            .lock()
            .await
            .get(&kind)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_workloads(&self, _namespace: &Namespace) -> AppResult<Vec<Workload>> {
        self.list_calls.lock().await.push("pod".to_owned());
        tokio::time::sleep(self.list_delay).await;

        if self.failing_list == Some(FailingList::Workloads) {
            return Err(AppError::Fetch("failed to list pods".to_owned()));
        }

        Ok(self.workloads.lock().await.clone())
    }
}

#[async_trait]
impl ClusterWriter for FakeCluster {
    async fn delete(&self, candidate: &Candidate, mode: DeleteMode) -> AppResult<()> {
        self.delete_calls
            .lock()
            .await
            .push((candidate.object().clone(), mode));

        let in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        tokio::time::sleep(self.delete_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_deletes.contains(candidate.name()) {
            return Err(AppError::Deletion(format!(
                "admission webhook denied delete of '{}'",
                candidate.name()
            )));
        }

        if self.missing_deletes.contains(candidate.name()) {
            return Err(AppError::NotFound(format!(
                "{} '{}' not found",
                candidate.kind(),
                candidate.name()
            )));
        }

        if self.conflicting_deletes.contains(candidate.name()) {
            return Err(AppError::Conflict(format!(
                "precondition failed for {} '{}'",
                candidate.kind(),
                candidate.name()
            )));
        }

        if mode == DeleteMode::Commit
            && let Some(stored) = self.candidates.lock().await.get_mut(&candidate.kind())
        {
            stored.retain(|existing| existing.name() != candidate.name());
        }

        Ok(())
    }
}
