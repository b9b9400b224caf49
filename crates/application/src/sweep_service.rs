use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use cfgsweep_core::{AppError, AppResult, Namespace};
use cfgsweep_domain::{Candidate, KindReport, ObjectKind, RetentionPolicy, RunReport, Workload};
use futures::future::{join_all, try_join_all};
use tokio::time::{Instant, timeout_at};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::orphan_selector::select_orphans;
use crate::{ClusterReader, ClusterWriter, DeleteMode, DeletionExecutor};

/// Settings for one sweep, constructed once and passed in explicitly.
#[derive(Debug, Clone)]
pub struct SweepSettings {
    /// Namespace applied to every list and delete.
    pub namespace: Namespace,
    /// Minimum candidate age.
    pub retention: RetentionPolicy,
    /// Kinds that are fetched, selected, and deleted.
    pub enabled_kinds: BTreeSet<ObjectKind>,
    /// Submits deletes in validate-only mode when set.
    pub dry_run: bool,
    /// Upper bound on concurrent delete requests across all kinds.
    pub max_concurrent_deletes: usize,
    /// Deadline for the whole run measured from its start.
    pub timeout: Duration,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            namespace: Namespace::default(),
            retention: RetentionPolicy::default(),
            enabled_kinds: ObjectKind::all().iter().copied().collect(),
            dry_run: false,
            max_concurrent_deletes: 10,
            timeout: Duration::from_secs(300),
        }
    }
}

impl SweepSettings {
    fn validate(&self) -> AppResult<()> {
        if self.enabled_kinds.is_empty() {
            return Err(AppError::Configuration(
                "at least one object kind must be enabled".to_owned(),
            ));
        }

        if self.max_concurrent_deletes == 0 {
            return Err(AppError::Configuration(
                "max concurrent deletes must be greater than zero".to_owned(),
            ));
        }

        if self.timeout.is_zero() {
            return Err(AppError::Configuration(
                "run timeout must be greater than zero".to_owned(),
            ));
        }

        self.deadline_from(Instant::now()).map(|_| ())
    }

    fn deadline_from(&self, start: Instant) -> AppResult<Instant> {
        start.checked_add(self.timeout).ok_or_else(|| {
            AppError::Configuration(format!(
                "run timeout of {}s is too large",
                self.timeout.as_secs()
            ))
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum RunPhase {
    Start,
    Fetching,
    Selecting,
    Deleting,
    Reporting,
    Done,
    Fatal,
}

impl RunPhase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Fetching => "fetching_candidates_and_workloads",
            Self::Selecting => "selecting",
            Self::Deleting => "deleting",
            Self::Reporting => "reporting",
            Self::Done => "done",
            Self::Fatal => "fatal",
        }
    }
}

struct Snapshot {
    candidates: Vec<(ObjectKind, Vec<Candidate>)>,
    workloads: Vec<Workload>,
}

struct Selection {
    kind: ObjectKind,
    examined: usize,
    orphans: Vec<Candidate>,
}

/// Drives one fetch, select, delete, report cycle over a namespace.
#[derive(Clone)]
pub struct SweepService {
    reader: Arc<dyn ClusterReader>,
    executor: DeletionExecutor,
    settings: SweepSettings,
}

impl SweepService {
    /// Creates a sweep service from validated settings.
    pub fn new(
        reader: Arc<dyn ClusterReader>,
        writer: Arc<dyn ClusterWriter>,
        settings: SweepSettings,
    ) -> AppResult<Self> {
        settings.validate()?;
        let executor = DeletionExecutor::new(writer, settings.max_concurrent_deletes)?;

        Ok(Self {
            reader,
            executor,
            settings,
        })
    }

    /// Returns the settings this service runs with.
    #[must_use]
    pub fn settings(&self) -> &SweepSettings {
        &self.settings
    }

    /// Runs one sweep using the current wall clock as the age cutoff reference.
    pub async fn run(&self) -> AppResult<RunReport> {
        self.run_at(Utc::now()).await
    }

    /// Runs one sweep with `now` as the single age cutoff reference for every kind.
    ///
    /// Fetch failures abort the run before any delete is issued. Delete
    /// failures are recorded per object and never abort the run.
    pub async fn run_at(&self, now: DateTime<Utc>) -> AppResult<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "sweep",
            run_id = %run_id,
            namespace = %self.settings.namespace,
        );

        self.run_phases(run_id, now).instrument(span).await
    }

    async fn run_phases(&self, run_id: String, now: DateTime<Utc>) -> AppResult<RunReport> {
        let deadline = self.settings.deadline_from(Instant::now())?;
        let mode = DeleteMode::from_dry_run(self.settings.dry_run);
        enter(RunPhase::Start);

        enter(RunPhase::Fetching);
        let snapshot = match self.fetch_snapshot(deadline).await {
            Ok(snapshot) => snapshot,
            Err(error) => {
                warn!(
                    phase = RunPhase::Fatal.as_str(),
                    error = %error,
                    "sweep aborted before selection"
                );
                return Err(error);
            }
        };

        enter(RunPhase::Selecting);
        let selections: Vec<Selection> = snapshot
            .candidates
            .into_iter()
            .map(|(kind, candidates)| Selection {
                kind,
                examined: candidates.len(),
                orphans: select_orphans(
                    &candidates,
                    &snapshot.workloads,
                    &self.settings.retention,
                    now,
                ),
            })
            .collect();

        enter(RunPhase::Deleting);
        let kind_reports = join_all(selections.into_iter().map(|selection| async move {
            let records = self
                .executor
                .execute(selection.orphans, mode, deadline)
                .await;
            KindReport::new(selection.kind, selection.examined, records)
        }))
        .await;

        enter(RunPhase::Reporting);
        let mut report = RunReport::new(
            run_id,
            self.settings.namespace.clone(),
            self.settings.dry_run,
            now,
        );
        for kind_report in kind_reports {
            report.merge(kind_report);
        }

        info!(
            dry_run = report.dry_run(),
            deleted = report.deleted_count(),
            skipped = report.skipped_count(),
            failed = report.failed_count(),
            "sweep finished"
        );
        enter(RunPhase::Done);

        Ok(report)
    }

    async fn fetch_snapshot(&self, deadline: Instant) -> AppResult<Snapshot> {
        let namespace = &self.settings.namespace;
        let candidate_fetches = try_join_all(self.settings.enabled_kinds.iter().map(
            |kind| async move {
                let candidates = self.reader.list_candidates(namespace, *kind).await?;
                debug!(kind = %kind, count = candidates.len(), "candidates fetched");
                Ok::<_, AppError>((*kind, candidates))
            },
        ));
        let workload_fetch = async {
            let workloads = self.reader.list_workloads(namespace).await?;
            debug!(count = workloads.len(), "workloads fetched");
            Ok::<_, AppError>(workloads)
        };

        let (candidates, workloads) = timeout_at(deadline, async {
            tokio::try_join!(candidate_fetches, workload_fetch)
        })
        .await
        .map_err(|_| {
            AppError::DeadlineExceeded(
                "fetch phase did not complete before the run deadline".to_owned(),
            )
        })??;

        Ok(Snapshot {
            candidates,
            workloads,
        })
    }
}

fn enter(phase: RunPhase) {
    debug!(phase = phase.as_str(), "sweep phase entered");
}
