use std::fmt::Debug;

use async_trait::async_trait;
use cfgsweep_application::{ClusterReader, ClusterWriter, DeleteMode};
use cfgsweep_core::{AppError, AppResult, Namespace};
use cfgsweep_domain::{Candidate, ObjectKind, Workload};
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret};
use kube::api::{Api, DeleteParams, ListParams, Preconditions};
use kube::{Client, Resource};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

mod conversions;


/// Kubernetes API adapter for both cluster ports.
///
/// The client is shared by every concurrent list and delete in a run.
#[derive(Clone)]
pub struct KubeCluster {
    client: Client,
    page_size: u32,
}

impl KubeCluster {
    /// Creates an adapter that pages list calls by `page_size` items.
    #[must_use]
    pub fn new(client: Client, page_size: u32) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    async fn list_all<K>(&self, namespace: &Namespace) -> AppResult<Vec<K>>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace.as_str());
        let mut items = Vec::new();
        let mut continue_token: Option<String> = None;

        loop {
            let mut params = ListParams::default().limit(self.page_size);
            if let Some(token) = continue_token.as_deref() {
                params = params.continue_token(token);
            }

            let page = api.list(&params).await.map_err(|error| {
                AppError::Fetch(format!(
                    "failed to list {} in namespace '{namespace}': {error}",
                    K::plural(&())
                ))
            })?;
            items.extend(page.items);

            match page.metadata.continue_ {
                Some(token) if !token.is_empty() => continue_token = Some(token),
                _ => break,
            }
        }

        debug!(
            resource = %K::plural(&()),
            namespace = %namespace,
            count = items.len(),
            "listed resources"
        );

        Ok(items)
    }

    async fn delete_named<K>(&self, candidate: &Candidate, mode: DeleteMode) -> AppResult<()>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), candidate.namespace().as_str());

        api.delete(candidate.name(), &delete_params(candidate, mode))
            .await
            .map(|_| ())
            .map_err(|error| map_delete_error(candidate, error))
    }
}

#[async_trait]
impl ClusterReader for KubeCluster {
    async fn list_candidates(
        &self,
        namespace: &Namespace,
        kind: ObjectKind,
    ) -> AppResult<Vec<Candidate>> {
        let converted: Vec<AppResult<Candidate>> = match kind {
            ObjectKind::ConfigMap => self
                .list_all::<ConfigMap>(namespace)
                .await?
                .iter()
                .map(|config_map| conversions::config_map_candidate(config_map, namespace))
                .collect(),
            ObjectKind::Secret => self
                .list_all::<Secret>(namespace)
                .await?
                .iter()
                .map(|secret| conversions::secret_candidate(secret, namespace))
                .collect(),
        };

        // Objects without a name or creation time are never eligible.
        Ok(converted
            .into_iter()
            .filter_map(|candidate| match candidate {
                Ok(candidate) => Some(candidate),
                Err(error) => {
                    warn!(kind = %kind, error = %error, "ignoring unreadable candidate");
                    None
                }
            })
            .collect())
    }

    async fn list_workloads(&self, namespace: &Namespace) -> AppResult<Vec<Workload>> {
        // An unreadable pod could hide a reference, so it fails the fetch.
        self.list_all::<Pod>(namespace)
            .await?
            .iter()
            .map(|pod| conversions::pod_workload(pod, namespace))
            .collect()
    }
}

#[async_trait]
impl ClusterWriter for KubeCluster {
    async fn delete(&self, candidate: &Candidate, mode: DeleteMode) -> AppResult<()> {
        match candidate.kind() {
            ObjectKind::ConfigMap => self.delete_named::<ConfigMap>(candidate, mode).await,
            ObjectKind::Secret => self.delete_named::<Secret>(candidate, mode).await,
        }
    }
}

/// Delete options pinning the object to the uid and version seen at list time.
fn delete_params(candidate: &Candidate, mode: DeleteMode) -> DeleteParams {
    DeleteParams {
        dry_run: mode.is_dry_run(),
        preconditions: Some(Preconditions {
            uid: candidate.uid().map(str::to_owned),
            resource_version: candidate.resource_version().map(str::to_owned),
        }),
        ..DeleteParams::default()
    }
}

fn map_delete_error(candidate: &Candidate, error: kube::Error) -> AppError {
    match error {
        kube::Error::Api(response) if response.code == 404 => AppError::NotFound(format!(
            "{} '{}' no longer exists",
            candidate.kind(),
            candidate.name()
        )),
        kube::Error::Api(response) if response.code == 409 => AppError::Conflict(format!(
            "{} '{}' changed since it was listed: {}",
            candidate.kind(),
            candidate.name(),
            response.message
        )),
        error => AppError::Deletion(format!(
            "failed to delete {} '{}': {error}",
            candidate.kind(),
            candidate.name()
        )),
    }
}
