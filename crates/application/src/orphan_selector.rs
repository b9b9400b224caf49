use chrono::{DateTime, Utc};
use cfgsweep_domain::{Candidate, RetentionPolicy, Workload};
use tracing::{debug, info};

/// Returns candidates at least `policy.period()` old at `now`, in input order.
#[must_use]
pub fn filter_by_age<'a>(
    candidates: &'a [Candidate],
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<&'a Candidate> {
    candidates
        .iter()
        .filter(|candidate| policy.is_expired(candidate.creation_time(), now))
        .collect()
}

/// Returns true when any workload declares an exact `(kind, name)` dependency on the candidate.
#[must_use]
pub fn is_referenced(candidate: &Candidate, workloads: &[Workload]) -> bool {
    workloads
        .iter()
        .any(|workload| workload.references(candidate.object()))
}

/// Selects expired, unretained, unreferenced candidates in input order.
#[must_use]
pub fn select_orphans(
    candidates: &[Candidate],
    workloads: &[Workload],
    policy: &RetentionPolicy,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    filter_by_age(candidates, policy, now)
        .into_iter()
        .filter(|candidate| {
            if let Some(reason) = candidate.retain() {
                debug!(
                    kind = %candidate.kind(),
                    name = candidate.name(),
                    reason = reason.as_str(),
                    "candidate retained"
                );
                return false;
            }

            if is_referenced(candidate, workloads) {
                debug!(
                    kind = %candidate.kind(),
                    name = candidate.name(),
                    "candidate referenced by workload"
                );
                return false;
            }

            info!(
                kind = %candidate.kind(),
                name = candidate.name(),
                namespace = %candidate.namespace(),
                created_at = %candidate.creation_time(),
                "orphaned candidate selected"
            );
            true
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use cfgsweep_core::Namespace;
    use cfgsweep_domain::{
        Candidate, CandidateInput, ObjectKind, ObjectRef, RetainReason, RetentionPolicy, Workload,
    };
    use proptest::prelude::*;

    use super::{filter_by_age, is_referenced, select_orphans};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(|| unreachable!())
    }

    fn candidate(kind: ObjectKind, name: &str, age: TimeDelta) -> Candidate {
        Candidate::new(CandidateInput {
            kind,
            name: name.to_owned(),
            namespace: Namespace::default(),
            uid: None,
            resource_version: None,
            creation_time: now() - age,
            retain: None,
        })
        .unwrap_or_else(|_| unreachable!())
    }

    fn workload(name: &str, references: &[(ObjectKind, &str)]) -> Workload {
        let references = references
            .iter()
            .map(|(kind, name)| ObjectRef::new(*kind, *name).unwrap_or_else(|_| unreachable!()));
        Workload::new(name, Namespace::default(), references).unwrap_or_else(|_| unreachable!())
    }

    fn names(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(Candidate::name).collect()
    }

    #[test]
    fn old_unreferenced_config_map_is_selected_and_new_one_is_not() {
        let candidates = vec![
            candidate(ObjectKind::ConfigMap, "cfg-old", TimeDelta::days(40)),
            candidate(ObjectKind::ConfigMap, "cfg-new", TimeDelta::days(2)),
        ];

        let selected = select_orphans(&candidates, &[], &RetentionPolicy::default(), now());

        assert_eq!(names(&selected), vec!["cfg-old"]);
    }

    #[test]
    fn referenced_secret_is_never_selected() {
        let candidates = vec![candidate(ObjectKind::Secret, "db-creds", TimeDelta::days(60))];
        let workloads = vec![workload("api-0", &[(ObjectKind::Secret, "db-creds")])];

        let selected = select_orphans(&candidates, &workloads, &RetentionPolicy::default(), now());

        assert!(selected.is_empty());
    }

    #[test]
    fn matching_requires_same_kind_and_full_name() {
        let secret = candidate(ObjectKind::Secret, "db", TimeDelta::days(60));
        let workloads = vec![
            workload("api-0", &[(ObjectKind::ConfigMap, "db")]),
            workload("api-1", &[(ObjectKind::Secret, "db-creds")]),
        ];

        assert!(!is_referenced(&secret, &workloads));
    }

    #[test]
    fn retained_candidates_are_skipped() {
        let retained = Candidate::new(CandidateInput {
            kind: ObjectKind::ConfigMap,
            name: "kube-root-ca.crt".to_owned(),
            namespace: Namespace::default(),
            uid: None,
            resource_version: None,
            creation_time: now() - TimeDelta::days(400),
            retain: Some(RetainReason::SystemManaged),
        })
        .unwrap_or_else(|_| unreachable!());

        let selected = select_orphans(&[retained], &[], &RetentionPolicy::default(), now());

        assert!(selected.is_empty());
    }

    #[test]
    fn selection_keeps_input_order_and_is_repeatable() {
        let candidates = vec![
            candidate(ObjectKind::ConfigMap, "zeta", TimeDelta::days(31)),
            candidate(ObjectKind::ConfigMap, "alpha", TimeDelta::days(90)),
            candidate(ObjectKind::ConfigMap, "used", TimeDelta::days(90)),
            candidate(ObjectKind::ConfigMap, "mid", TimeDelta::days(45)),
        ];
        let workloads = vec![workload("web-0", &[(ObjectKind::ConfigMap, "used")])];
        let policy = RetentionPolicy::default();

        let first = select_orphans(&candidates, &workloads, &policy, now());
        let second = select_orphans(&candidates, &workloads, &policy, now());

        assert_eq!(names(&first), vec!["zeta", "alpha", "mid"]);
        assert_eq!(first, second);
    }

    proptest! {
        #[test]
        fn age_filter_is_strict(
            ages in prop::collection::vec(0_i64..10_000, 0..32),
            period in 0_i64..10_000,
        ) {
            let candidates: Vec<Candidate> = ages
                .iter()
                .enumerate()
                .map(|(index, age)| {
                    candidate(ObjectKind::ConfigMap, &format!("cm-{index}"), TimeDelta::minutes(*age))
                })
                .collect();
            let policy = RetentionPolicy::new(TimeDelta::minutes(period))
                .unwrap_or_else(|_| unreachable!());

            let passed = filter_by_age(&candidates, &policy, now());

            for candidate in &candidates {
                let age = now() - candidate.creation_time();
                let included = passed.iter().any(|passed| passed.name() == candidate.name());
                prop_assert_eq!(included, age >= policy.period());
            }
        }

        #[test]
        fn age_filter_is_monotonic_in_period(
            ages in prop::collection::vec(0_i64..10_000, 0..32),
            shorter in 0_i64..5_000,
            extra in 0_i64..5_000,
        ) {
            let candidates: Vec<Candidate> = ages
                .iter()
                .enumerate()
                .map(|(index, age)| {
                    candidate(ObjectKind::Secret, &format!("s-{index}"), TimeDelta::minutes(*age))
                })
                .collect();
            let short_policy = RetentionPolicy::new(TimeDelta::minutes(shorter))
                .unwrap_or_else(|_| unreachable!());
            let long_policy = RetentionPolicy::new(TimeDelta::minutes(shorter + extra))
                .unwrap_or_else(|_| unreachable!());

            let short_pass = filter_by_age(&candidates, &short_policy, now());
            let long_pass = filter_by_age(&candidates, &long_policy, now());

            prop_assert!(long_pass.len() <= short_pass.len());
            for candidate in long_pass {
                prop_assert!(short_pass.iter().any(|passed| passed.name() == candidate.name()));
            }
        }
    }
}
