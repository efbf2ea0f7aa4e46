//! Conflict detector
//!
//! Pure function over (requirements, installed snapshot, config) → per-package
//! status. Sources are folded in lexicographic name order, so the reported
//! conflicting pair is reproducible:
//! - when the running intersection first becomes empty at source `k`, the pair
//!   is `(j, k)` for the earliest earlier source `j` whose own set does not
//!   overlap `k`'s
//! - a source whose own lines already contradict each other is reported as `(k, k)`
//! - if no single earlier source is disjoint from `k` (the emptiness needs three
//!   or more sources), the pair is `(first source, k)`

use crate::config::EngineConfig;
use crate::constraint::{to_set, ConstraintSet};
use crate::domain::{
    package_key, Classification, ConflictPair, Contribution, PackageStatus, Requirement,
};
use crate::snapshot::EnvironmentSnapshot;
use std::collections::{BTreeMap, BTreeSet};

/// Classify every package mentioned by a requirement or present in the snapshot
pub fn detect(
    requirements: &[Requirement],
    snapshot: &EnvironmentSnapshot,
    config: &EngineConfig,
) -> BTreeMap<String, PackageStatus> {
    let mut groups: BTreeMap<String, Vec<&Requirement>> = BTreeMap::new();
    let mut referenced: BTreeSet<String> = BTreeSet::new();

    for requirement in requirements {
        if config.is_ignored(&requirement.name) {
            continue;
        }
        referenced.insert(package_key(
            &requirement.display_name,
            config.case_sensitive_names,
        ));
        groups
            .entry(requirement.package_key(config.strict_extras, config.case_sensitive_names))
            .or_default()
            .push(requirement);
    }

    let mut statuses: BTreeMap<String, PackageStatus> = groups
        .into_iter()
        .map(|(key, group)| {
            let status = classify_group(&key, group, snapshot, config);
            (key, status)
        })
        .collect();

    for package in snapshot.iter() {
        let key = package_key(&package.name, config.case_sensitive_names);
        if referenced.contains(&key) || statuses.contains_key(&key) || config.is_ignored(&key) {
            continue;
        }
        statuses.insert(
            key.clone(),
            PackageStatus {
                name: key,
                aggregate: ConstraintSet::universal(),
                per_source: BTreeMap::new(),
                contributions: Vec::new(),
                installed: Some(package.version.clone()),
                classification: Classification::Unconstrained,
                conflict_pair: None,
            },
        );
    }

    statuses
}

fn classify_group(
    key: &str,
    mut group: Vec<&Requirement>,
    snapshot: &EnvironmentSnapshot,
    config: &EngineConfig,
) -> PackageStatus {
    group.sort_by(|a, b| {
        a.source
            .cmp(&b.source)
            .then(a.line_number.cmp(&b.line_number))
    });

    let mut per_source: BTreeMap<String, ConstraintSet> = BTreeMap::new();
    for requirement in &group {
        let set = to_set(requirement);
        per_source
            .entry(requirement.source.name.clone())
            .and_modify(|existing| *existing = existing.intersect(&set))
            .or_insert(set);
    }

    let (aggregate, conflict_pair) = fold_sources(&per_source);

    let installed = group
        .first()
        .and_then(|r| snapshot.installed(&r.display_name, config.case_sensitive_names))
        .cloned();

    let classification = if aggregate.is_empty() {
        Classification::Conflict
    } else if installed.as_ref().is_some_and(|v| !aggregate.contains(v)) {
        Classification::Violation
    } else {
        Classification::Ok
    };

    let contributions = group
        .iter()
        .map(|requirement| Contribution {
            source: requirement.source.clone(),
            clause: clause_text(requirement),
            line_number: requirement.line_number,
        })
        .collect();

    PackageStatus {
        name: key.to_string(),
        aggregate,
        per_source,
        contributions,
        installed,
        classification,
        conflict_pair,
    }
}

/// Intersect per-source sets in key order, remembering the first incompatible pair
fn fold_sources(
    per_source: &BTreeMap<String, ConstraintSet>,
) -> (ConstraintSet, Option<ConflictPair>) {
    let mut aggregate = ConstraintSet::universal();

    for (index, (name, set)) in per_source.iter().enumerate() {
        aggregate = aggregate.intersect(set);
        if aggregate.is_empty() {
            let first = if set.is_empty() {
                name.clone()
            } else {
                per_source
                    .iter()
                    .take(index)
                    .find(|(_, earlier)| earlier.intersect(set).is_empty())
                    .or_else(|| per_source.iter().next())
                    .map(|(earlier_name, _)| earlier_name.clone())
                    .unwrap_or_else(|| name.clone())
            };
            let pair = ConflictPair {
                first,
                second: name.clone(),
            };
            return (aggregate, Some(pair));
        }
    }

    (aggregate, None)
}

fn clause_text(requirement: &Requirement) -> String {
    match &requirement.url {
        Some(url) => format!("@ {}", url),
        None => requirement.raw_specifier.clone(),
    }
}
