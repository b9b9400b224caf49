//! Application services and ports.

#![forbid(unsafe_code)]

mod cluster_ports;
mod deletion_executor;
mod orphan_selector;
mod sweep_service;

#[cfg(test)]
mod test_fakes;

pub use cluster_ports::{ClusterReader, ClusterWriter, DeleteMode};
pub use deletion_executor::DeletionExecutor;
pub use orphan_selector::{filter_by_age, is_referenced, select_orphans};
pub use sweep_service::{SweepService, SweepSettings};
