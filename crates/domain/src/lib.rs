//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod candidate;
mod kind;
mod report;
mod retention;
mod workload;

pub use candidate::{Candidate, CandidateInput, RETAIN_ANNOTATION, RetainReason};
pub use kind::{ObjectKind, ObjectRef};
pub use report::{DeletionOutcome, DeletionRecord, KindReport, RunReport, SkipReason};
pub use retention::RetentionPolicy;
pub use workload::Workload;
