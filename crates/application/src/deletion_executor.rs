use std::sync::Arc;

use cfgsweep_core::{AppError, AppResult};
use cfgsweep_domain::{Candidate, DeletionOutcome, DeletionRecord, SkipReason};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout_at};
use tracing::{info, warn};

use crate::{ClusterWriter, DeleteMode};

const IN_FLIGHT_DEADLINE_MESSAGE: &str = "deadline exceeded while delete was in flight";

/// Issues deletes for selected candidates with a bounded number in flight.
///
/// Clones share one permit pool, so the bound holds across every kind
/// processed in a run.
#[derive(Clone)]
pub struct DeletionExecutor {
    writer: Arc<dyn ClusterWriter>,
    permits: Arc<Semaphore>,
}

impl DeletionExecutor {
    /// Creates an executor allowing at most `max_in_flight` concurrent deletes.
    pub fn new(writer: Arc<dyn ClusterWriter>, max_in_flight: usize) -> AppResult<Self> {
        if max_in_flight == 0 {
            return Err(AppError::Configuration(
                "max concurrent deletes must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            writer,
            permits: Arc::new(Semaphore::new(max_in_flight)),
        })
    }

    /// Deletes every candidate once and returns one record per candidate in input order.
    ///
    /// A failed delete never prevents other candidates from being attempted.
    pub async fn execute(
        &self,
        deletion_set: Vec<Candidate>,
        mode: DeleteMode,
        deadline: Instant,
    ) -> Vec<DeletionRecord> {
        join_all(
            deletion_set
                .into_iter()
                .map(|candidate| self.delete_one(candidate, mode, deadline)),
        )
        .await
    }

    async fn delete_one(
        &self,
        candidate: Candidate,
        mode: DeleteMode,
        deadline: Instant,
    ) -> DeletionRecord {
        let outcome = self.attempt(&candidate, mode, deadline).await;

        match &outcome {
            DeletionOutcome::Deleted => info!(
                kind = %candidate.kind(),
                name = candidate.name(),
                dry_run = mode.is_dry_run(),
                "candidate deleted"
            ),
            DeletionOutcome::Skipped(reason) => info!(
                kind = %candidate.kind(),
                name = candidate.name(),
                reason = reason.as_str(),
                "candidate delete skipped"
            ),
            DeletionOutcome::Failed(error) => warn!(
                kind = %candidate.kind(),
                name = candidate.name(),
                error = %error,
                "candidate delete failed"
            ),
        }

        DeletionRecord {
            object: candidate.object().clone(),
            outcome,
        }
    }

    async fn attempt(
        &self,
        candidate: &Candidate,
        mode: DeleteMode,
        deadline: Instant,
    ) -> DeletionOutcome {
        if Instant::now() >= deadline {
            return DeletionOutcome::Skipped(SkipReason::DeadlineExceeded);
        }

        let permit = match timeout_at(deadline, self.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(error)) => {
                return DeletionOutcome::Failed(format!("delete slot unavailable: {error}"));
            }
            Err(_) => return DeletionOutcome::Skipped(SkipReason::DeadlineExceeded),
        };

        // A permit can be handed over at the same tick the deadline fires.
        if Instant::now() >= deadline {
            return DeletionOutcome::Skipped(SkipReason::DeadlineExceeded);
        }

        let result = timeout_at(deadline, self.writer.delete(candidate, mode)).await;
        drop(permit);

        match result {
            Ok(Ok(())) => DeletionOutcome::Deleted,
            Ok(Err(AppError::NotFound(_))) => DeletionOutcome::Skipped(SkipReason::AlreadyGone),
            Ok(Err(AppError::Conflict(_))) => DeletionOutcome::Skipped(SkipReason::Changed),
            Ok(Err(error)) => DeletionOutcome::Failed(error.to_string()),
            Err(_) => DeletionOutcome::Failed(IN_FLIGHT_DEADLINE_MESSAGE.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use cfgsweep_domain::{DeletionOutcome, ObjectKind, SkipReason};
    use tokio::time::Instant;

    use super::{DeletionExecutor, IN_FLIGHT_DEADLINE_MESSAGE};
    use crate::DeleteMode;
    use crate::test_fakes::{FakeCluster, aged};

    fn orphans(count: usize) -> Vec<cfgsweep_domain::Candidate> {
        (0..count)
            .map(|index| aged(ObjectKind::ConfigMap, &format!("cm-{index}"), 45))
            .collect()
    }

    #[test]
    fn zero_bound_is_rejected() {
        let cluster = Arc::new(FakeCluster::default());
        assert!(DeletionExecutor::new(cluster, 0).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn one_failure_does_not_block_the_rest() {
        let cluster = Arc::new(FakeCluster {
            delete_delay: Duration::from_millis(50),
            failing_deletes: BTreeSet::from(["cm-2".to_owned()]),
            ..FakeCluster::default()
        });
        let executor = DeletionExecutor::new(cluster.clone(), 2);
        assert!(executor.is_ok());
        let executor = executor.unwrap_or_else(|_| unreachable!());

        let records = executor
            .execute(
                orphans(5),
                DeleteMode::Commit,
                Instant::now() + Duration::from_secs(60),
            )
            .await;

        let deleted = records
            .iter()
            .filter(|record| record.outcome == DeletionOutcome::Deleted)
            .count();
        let failed: Vec<&str> = records
            .iter()
            .filter(|record| matches!(record.outcome, DeletionOutcome::Failed(_)))
            .map(|record| record.object.name())
            .collect();

        assert_eq!(deleted, 4);
        assert_eq!(failed, vec!["cm-2"]);
        assert_eq!(cluster.delete_calls.lock().await.len(), 5);
        assert!(cluster.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn bound_is_reached_but_never_exceeded() {
        let cluster = Arc::new(FakeCluster {
            delete_delay: Duration::from_millis(20),
            ..FakeCluster::default()
        });
        let executor = DeletionExecutor::new(cluster.clone(), 3).unwrap_or_else(|_| unreachable!());

        let records = executor
            .execute(
                orphans(12),
                DeleteMode::Commit,
                Instant::now() + Duration::from_secs(60),
            )
            .await;

        assert_eq!(records.len(), 12);
        assert_eq!(cluster.max_in_flight.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_skips_unattempted_and_fails_in_flight() {
        let cluster = Arc::new(FakeCluster {
            delete_delay: Duration::from_secs(4),
            ..FakeCluster::default()
        });
        let executor = DeletionExecutor::new(cluster.clone(), 1).unwrap_or_else(|_| unreachable!());

        let records = executor
            .execute(
                orphans(5),
                DeleteMode::Commit,
                Instant::now() + Duration::from_secs(10),
            )
            .await;

        let outcomes: Vec<DeletionOutcome> =
            records.into_iter().map(|record| record.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                DeletionOutcome::Deleted,
                DeletionOutcome::Deleted,
                DeletionOutcome::Failed(IN_FLIGHT_DEADLINE_MESSAGE.to_owned()),
                DeletionOutcome::Skipped(SkipReason::DeadlineExceeded),
                DeletionOutcome::Skipped(SkipReason::DeadlineExceeded),
            ]
        );
        assert_eq!(cluster.delete_calls.lock().await.len(), 3);
    }

    #[tokio::test]
    async fn missing_object_is_skipped_not_failed() {
        let cluster = Arc::new(FakeCluster {
            missing_deletes: BTreeSet::from(["cm-0".to_owned()]),
            ..FakeCluster::default()
        });
        let executor = DeletionExecutor::new(cluster, 4).unwrap_or_else(|_| unreachable!());

        let records = executor
            .execute(
                orphans(1),
                DeleteMode::ValidateOnly,
                Instant::now() + Duration::from_secs(5),
            )
            .await;

        assert_eq!(
            records[0].outcome,
            DeletionOutcome::Skipped(SkipReason::AlreadyGone)
        );
    }

    #[tokio::test]
    async fn replaced_object_is_skipped_as_changed() {
        let cluster = Arc::new(FakeCluster {
            conflicting_deletes: BTreeSet::from(["cm-1".to_owned()]),
            ..FakeCluster::default()
        });
        let executor = DeletionExecutor::new(cluster.clone(), 2).unwrap_or_else(|_| unreachable!());

        let records = executor
            .execute(
                orphans(2),
                DeleteMode::Commit,
                Instant::now() + Duration::from_secs(5),
            )
            .await;

        assert_eq!(records[0].outcome, DeletionOutcome::Deleted);
        assert_eq!(
            records[1].outcome,
            DeletionOutcome::Skipped(SkipReason::Changed)
        );
        assert_eq!(cluster.delete_calls.lock().await.len(), 2);
    }
}
