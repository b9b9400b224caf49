use cfgsweep_domain::{ObjectKind, ObjectRef};
use serde_json::Value;

const CONTAINER_FIELDS: &[&str] = &["containers", "initContainers", "ephemeralContainers"];
const VOLUME_SECRET_REF_FIELDS: &[&str] = &["secretRef", "nodePublishSecretRef"];

/// Extracts every ConfigMap and Secret a pod spec declares it depends on.
///
/// Works on the API wire form of `PodSpec` so the same walk covers
/// containers, init containers, and ephemeral containers.
pub(crate) fn spec_references(spec: &Value) -> Vec<ObjectRef> {
    let mut references = Vec::new();

    for volume in items(spec, "volumes") {
        push(&mut references, ObjectKind::ConfigMap, volume.pointer("/configMap/name"));
        push(&mut references, ObjectKind::Secret, volume.pointer("/secret/secretName"));
        push(&mut references, ObjectKind::Secret, volume.pointer("/azureFile/secretName"));

        let projected_sources = volume
            .get("projected")
            .map_or(&[][..], |projected| items(projected, "sources"));
        for source in projected_sources {
            push(&mut references, ObjectKind::ConfigMap, source.pointer("/configMap/name"));
            push(&mut references, ObjectKind::Secret, source.pointer("/secret/name"));
        }

        // cephfs, cinder, csi, flexVolume, iscsi, rbd, scaleIO, storageos
        if let Some(sources) = volume.as_object() {
            for source in sources.values() {
                for field in VOLUME_SECRET_REF_FIELDS {
                    push(
                        &mut references,
                        ObjectKind::Secret,
                        source.get(*field).and_then(|reference| reference.get("name")),
                    );
                }
            }
        }
    }

    for field in CONTAINER_FIELDS {
        for container in items(spec, field) {
            for env_from in items(container, "envFrom") {
                push(&mut references, ObjectKind::ConfigMap, env_from.pointer("/configMapRef/name"));
                push(&mut references, ObjectKind::Secret, env_from.pointer("/secretRef/name"));
            }

            for env in items(container, "env") {
                push(
                    &mut references,
                    ObjectKind::ConfigMap,
                    env.pointer("/valueFrom/configMapKeyRef/name"),
                );
                push(
                    &mut references,
                    ObjectKind::Secret,
                    env.pointer("/valueFrom/secretKeyRef/name"),
                );
            }
        }
    }

    for pull_secret in items(spec, "imagePullSecrets") {
        push(&mut references, ObjectKind::Secret, pull_secret.get("name"));
    }

    references
}

fn items<'a>(value: &'a Value, field: &str) -> &'a [Value] {
    value
        .get(field)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

fn push(references: &mut Vec<ObjectRef>, kind: ObjectKind, name: Option<&Value>) {
    if let Some(reference) = name
        .and_then(Value::as_str)
        .and_then(|name| ObjectRef::new(kind, name).ok())
    {
        references.push(reference);
    }
}
