//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_cluster;
mod kube_client;
mod kube_cluster;
mod pod_references;

pub use in_memory_cluster::InMemoryCluster;
pub use kube_client::{KubeConnectOptions, connect};
pub use kube_cluster::KubeCluster;
