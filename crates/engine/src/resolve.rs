// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Turning a definition into the configurations one firing harvests

use hv_core::{finished_in_lineage, Domain, DomainConfiguration, HarvestDefinition, HarvestError, HarvestId};
use hv_storage::HarvestStore;
use std::collections::{BTreeMap, HashSet};

/// Configurations named by a selective definition's members.
///
/// A member whose domain is an alias of another member is left out, since
/// harvesting the target covers it.
pub fn resolve_selective(
    harvest: &HarvestDefinition,
    domains: &[Domain],
) -> Result<Vec<DomainConfiguration>, HarvestError> {
    let index: BTreeMap<&str, &Domain> = domains.iter().map(|d| (d.name.as_str(), d)).collect();
    let in_run: HashSet<&str> = harvest.members().iter().map(|m| m.domain.as_str()).collect();

    let mut configs = Vec::with_capacity(harvest.members().len());
    for member in harvest.members() {
        let domain = index
            .get(member.domain.as_str())
            .ok_or_else(|| HarvestError::unknown("domain", member.domain.clone()))?;
        let config = domain.configuration(&member.config)?;
        if covered_by_alias_target(domain, &in_run) {
            continue;
        }
        configs.push(config.clone());
    }
    Ok(configs)
}

/// Default configurations of every known domain for a snapshot firing.
///
/// Aliases of known domains are left out. When `lineage` is non-empty the
/// snapshot is incremental and domains whose latest outcome in it is
/// complete are left out as well.
pub fn resolve_snapshot(
    domains: &[Domain],
    lineage: &[HarvestId],
) -> Result<Vec<DomainConfiguration>, HarvestError> {
    let in_run: HashSet<&str> = domains.iter().map(|d| d.name.as_str()).collect();

    let mut configs = Vec::with_capacity(domains.len());
    let mut finished = 0usize;
    for domain in domains {
        if covered_by_alias_target(domain, &in_run) {
            continue;
        }
        let config = domain.default_configuration()?;
        if !lineage.is_empty() && finished_in_lineage(domain, config, lineage) {
            finished += 1;
            continue;
        }
        configs.push(config.clone());
    }
    if finished > 0 {
        tracing::debug!(finished, remaining = configs.len(), "skipped domains finished in earlier snapshots");
    }
    Ok(configs)
}

/// The chain of snapshots `harvest` continues, nearest first.
///
/// Stops at a missing link or a cycle.
pub fn lineage(store: &HarvestStore, harvest: &HarvestDefinition) -> Vec<HarvestId> {
    let mut chain = Vec::new();
    let mut seen = HashSet::from([harvest.id.clone()]);
    let mut next = harvest.previous_snapshot().cloned();
    while let Some(id) = next {
        if !seen.insert(id.clone()) {
            tracing::warn!(harvest_id = %harvest.id, at = %id, "snapshot lineage loops");
            break;
        }
        next = match store.harvest(&id) {
            Ok(previous) => previous.previous_snapshot().cloned(),
            Err(e) => {
                tracing::warn!(harvest_id = %harvest.id, previous = %id, error = %e, "snapshot lineage broken");
                None
            }
        };
        chain.push(id);
    }
    chain
}

fn covered_by_alias_target(domain: &Domain, in_run: &HashSet<&str>) -> bool {
    match domain.alias_of.as_deref() {
        Some(target) if in_run.contains(target) => {
            tracing::debug!(domain = %domain.name, alias_of = target, "skipping alias");
            true
        }
        _ => false,
    }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
