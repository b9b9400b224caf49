use cfgsweep_core::{AppError, AppResult, Namespace};
use cfgsweep_domain::{
    Candidate, CandidateInput, ObjectKind, RETAIN_ANNOTATION, RetainReason, Workload,
};
use k8s_openapi::api::core::v1::{ConfigMap, Pod, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::pod_references::spec_references;

pub(super) fn config_map_candidate(
    config_map: &ConfigMap,
    namespace: &Namespace,
) -> AppResult<Candidate> {
    candidate_from_metadata(ObjectKind::ConfigMap, &config_map.metadata, namespace, None)
}

pub(super) fn secret_candidate(secret: &Secret, namespace: &Namespace) -> AppResult<Candidate> {
    candidate_from_metadata(
        ObjectKind::Secret,
        &secret.metadata,
        namespace,
        secret.type_.as_deref(),
    )
}

pub(super) fn pod_workload(pod: &Pod, namespace: &Namespace) -> AppResult<Workload> {
    let name = pod
        .metadata
        .name
        .clone()
        .ok_or_else(|| AppError::Fetch("pod listed without a name".to_owned()))?;
    let spec = serde_json::to_value(&pod.spec).map_err(|error| {
        AppError::Fetch(format!("failed to read spec of pod '{name}': {error}"))
    })?;
    let references = spec_references(&spec);

    Workload::new(name, namespace.clone(), references)
}

fn candidate_from_metadata(
    kind: ObjectKind,
    metadata: &ObjectMeta,
    namespace: &Namespace,
    secret_type: Option<&str>,
) -> AppResult<Candidate> {
    let name = metadata
        .name
        .clone()
        .ok_or_else(|| AppError::Validation(format!("{kind} listed without a name")))?;
    let creation_time = metadata
        .creation_timestamp
        .as_ref()
        .map(|timestamp| timestamp.0)
        .ok_or_else(|| {
            AppError::Validation(format!("{kind} '{name}' has no creation timestamp"))
        })?;
    let retain_annotation = metadata
        .annotations
        .as_ref()
        .and_then(|annotations| annotations.get(RETAIN_ANNOTATION))
        .map(String::as_str);
    let retain = RetainReason::classify(kind, name.as_str(), retain_annotation, secret_type);

    Candidate::new(CandidateInput {
        kind,
        name,
        namespace: namespace.clone(),
        uid: metadata.uid.clone(),
        resource_version: metadata.resource_version.clone(),
        creation_time,
        retain,
    })
}
