use chrono::{DateTime, Utc};
use cfgsweep_core::{AppResult, Namespace, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::{ObjectKind, ObjectRef};

/// Annotation that opts one object out of sweeping when set to `"true"`.
pub const RETAIN_ANNOTATION: &str = "cfgsweep.io/retain";

const ROOT_CA_CONFIG_MAP: &str = "kube-root-ca.crt";
const SYSTEM_SECRET_TYPES: &[&str] = &["kubernetes.io/service-account-token", "helm.sh/release.v1"];

/// Why a candidate is never selected regardless of age or references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetainReason {
    /// Object carries the retain annotation.
    RetainAnnotation,
    /// Object is owned by a cluster or tooling controller.
    SystemManaged,
}

impl RetainReason {
    /// Classifies one object from the metadata the cluster reports for it.
    #[must_use]
    pub fn classify(
        kind: ObjectKind,
        name: &str,
        retain_annotation: Option<&str>,
        secret_type: Option<&str>,
    ) -> Option<Self> {
        if retain_annotation.is_some_and(|value| value.trim().eq_ignore_ascii_case("true")) {
            return Some(Self::RetainAnnotation);
        }

        let system_managed = match kind {
            ObjectKind::ConfigMap => name == ROOT_CA_CONFIG_MAP,
            ObjectKind::Secret => {
                secret_type.is_some_and(|value| SYSTEM_SECRET_TYPES.contains(&value))
            }
        };

        system_managed.then_some(Self::SystemManaged)
    }

    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RetainAnnotation => "retain_annotation",
            Self::SystemManaged => "system_managed",
        }
    }
}

/// Input payload for candidate construction.
#[derive(Debug, Clone)]
pub struct CandidateInput {
    /// Object kind.
    pub kind: ObjectKind,
    /// Object name.
    pub name: String,
    /// Namespace the object was listed from.
    pub namespace: Namespace,
    /// Cluster-assigned unique identifier.
    pub uid: Option<String>,
    /// Resource version observed at list time.
    pub resource_version: Option<String>,
    /// Cluster-side creation timestamp.
    pub creation_time: DateTime<Utc>,
    /// Optional reason to never select the object.
    pub retain: Option<RetainReason>,
}

/// One configuration object under consideration for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    object: ObjectRef,
    namespace: Namespace,
    uid: Option<String>,
    resource_version: Option<String>,
    creation_time: DateTime<Utc>,
    retain: Option<RetainReason>,
}

impl Candidate {
    /// Creates a validated candidate snapshot.
    pub fn new(input: CandidateInput) -> AppResult<Self> {
        let non_blank = |value: Option<String>| -> AppResult<Option<String>> {
            value.map(|value| NonEmptyString::new(value).map(String::from)).transpose()
        };

        Ok(Self {
            object: ObjectRef::new(input.kind, input.name)?,
            namespace: input.namespace,
            uid: non_blank(input.uid)?,
            resource_version: non_blank(input.resource_version)?,
            creation_time: input.creation_time,
            retain: input.retain,
        })
    }

    /// Returns the `(kind, name)` identity.
    #[must_use]
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// Returns the object kind.
    #[must_use]
    pub fn kind(&self) -> ObjectKind {
        self.object.kind()
    }

    /// Returns the object name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.object.name()
    }

    /// Returns the namespace the object lives in.
    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns the cluster uid, if reported.
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }

    /// Returns the observed resource version, if reported.
    #[must_use]
    pub fn resource_version(&self) -> Option<&str> {
        self.resource_version.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    /// Returns the retain reason, if any.
    #[must_use]
    pub fn retain(&self) -> Option<RetainReason> {
        self.retain
    }
}
