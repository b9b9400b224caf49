use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cfgsweep_core::Namespace;
use serde::{Deserialize, Serialize};

use crate::{ObjectKind, ObjectRef};

/// Why a selected candidate was not deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Run deadline elapsed before the delete was attempted.
    DeadlineExceeded,
    /// Object no longer existed when the delete was issued.
    AlreadyGone,
    /// Object was replaced or modified after the snapshot was taken.
    Changed,
}

impl SkipReason {
    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::AlreadyGone => "already_gone",
            Self::Changed => "changed",
        }
    }
}

/// Terminal result of processing one selected candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum DeletionOutcome {
    /// Delete was accepted; in validate-only mode nothing was committed.
    Deleted,
    /// Delete was not performed.
    Skipped(SkipReason),
    /// Delete was attempted and failed.
    Failed(String),
}

impl DeletionOutcome {
    /// Returns a stable status label.
    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }
}

/// Outcome for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRecord {
    /// Object identity.
    pub object: ObjectRef,
    /// Terminal outcome.
    pub outcome: DeletionOutcome,
}

/// Per-kind slice of a run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindReport {
    kind: ObjectKind,
    examined: usize,
    records: Vec<DeletionRecord>,
}

impl KindReport {
    /// Creates a kind report; records are ordered by object name.
    #[must_use]
    pub fn new(kind: ObjectKind, examined: usize, mut records: Vec<DeletionRecord>) -> Self {
        records.sort_by(|left, right| left.object.cmp(&right.object));
        Self {
            kind,
            examined,
            records,
        }
    }

    /// Returns the reported kind.
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    /// Returns how many candidates were fetched for this kind.
    #[must_use]
    pub fn examined(&self) -> usize {
        self.examined
    }

    /// Returns how many candidates were selected for deletion.
    #[must_use]
    pub fn selected(&self) -> usize {
        self.records.len()
    }

    /// Returns per-object outcomes ordered by name.
    #[must_use]
    pub fn records(&self) -> &[DeletionRecord] {
        &self.records
    }

    fn absorb(&mut self, other: KindReport) {
        self.examined += other.examined;
        self.records.extend(other.records);
        self.records
            .sort_by(|left, right| left.object.cmp(&right.object));
    }
}

/// Aggregated outcome of one sweep across all processed kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    run_id: String,
    namespace: Namespace,
    dry_run: bool,
    started_at: DateTime<Utc>,
    kinds: BTreeMap<ObjectKind, KindReport>,
}

impl RunReport {
    /// Creates an empty report for one run.
    #[must_use]
    pub fn new(
        run_id: impl Into<String>,
        namespace: Namespace,
        dry_run: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            namespace,
            dry_run,
            started_at,
            kinds: BTreeMap::new(),
        }
    }

    /// Merges one kind report. Merge order does not affect the result.
    pub fn merge(&mut self, report: KindReport) {
        match self.kinds.get_mut(&report.kind) {
            Some(existing) => existing.absorb(report),
            None => {
                self.kinds.insert(report.kind, report);
            }
        }
    }

    /// Returns the run correlation id.
    #[must_use]
    pub fn run_id(&self) -> &str {
        self.run_id.as_str()
    }

    /// Returns the swept namespace.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns true when deletes were issued in validate-only mode.
    #[must_use]
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Returns the instant used as `now` for every age decision in the run.
    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns the report for one kind when that kind was processed.
    #[must_use]
    pub fn kind(&self, kind: ObjectKind) -> Option<&KindReport> {
        self.kinds.get(&kind)
    }

    /// Returns processed kinds in report order.
    pub fn kinds(&self) -> impl Iterator<Item = &KindReport> {
        self.kinds.values()
    }

    /// Returns every record ordered by `(kind, name)`.
    pub fn records(&self) -> impl Iterator<Item = &DeletionRecord> {
        self.kinds.values().flat_map(|report| report.records.iter())
    }

    /// Returns failed records ordered by `(kind, name)`.
    #[must_use]
    pub fn failures(&self) -> Vec<&DeletionRecord> {
        self.records()
            .filter(|record| matches!(record.outcome, DeletionOutcome::Failed(_)))
            .collect()
    }

    /// Returns how many candidates were deleted.
    #[must_use]
    pub fn deleted_count(&self) -> usize {
        self.count_where(|outcome| matches!(outcome, DeletionOutcome::Deleted))
    }

    /// Returns how many selected candidates were skipped.
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.count_where(|outcome| matches!(outcome, DeletionOutcome::Skipped(_)))
    }

    /// Returns how many deletes failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.count_where(|outcome| matches!(outcome, DeletionOutcome::Failed(_)))
    }

    fn count_where(&self, predicate: impl Fn(&DeletionOutcome) -> bool) -> usize {
        self.records()
            .filter(|record| predicate(&record.outcome))
            .count()
    }
}
