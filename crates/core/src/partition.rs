// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Greedy size-based partitioning of domain configurations into jobs
//!
//! Configurations are bucketed by crawl template, sorted largest first and
//! walked once. A new job opens whenever the next configuration would make
//! the current one too large, too uneven, or would mix byte ceilings.

use crate::domain::DomainConfiguration;
use crate::harvest::ConfigRef;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Thresholds bounding the shape of a single job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartitionLimits {
    /// Largest allowed ratio between the biggest and smallest member
    pub max_relative_size_difference: u64,
    /// Size gaps at or below this are ignored by the ratio check
    pub min_absolute_size_difference: u64,
    /// Cap on the summed expected size of a job
    pub max_total_job_size: u64,
    /// Cap on members per job, applied to snapshot harvests only
    pub snapshot_config_count: Option<usize>,
    /// Drop configurations whose byte or object ceiling is zero
    pub exclude_zero_budget: bool,
}

impl Default for PartitionLimits {
    fn default() -> Self {
        Self {
            max_relative_size_difference: 100,
            min_absolute_size_difference: 2000,
            max_total_job_size: 2_000_000,
            snapshot_config_count: None,
            exclude_zero_budget: false,
        }
    }
}

/// Per-domain caps a harvest imposes on every job it produces
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCaps {
    #[serde(default)]
    pub max_objects: Option<u64>,
    #[serde(default)]
    pub max_bytes: Option<u64>,
    /// Seconds
    #[serde(default)]
    pub max_running_time: Option<u64>,
}

impl DomainCaps {
    pub fn unlimited() -> Self {
        Self::default()
    }
}

/// A job as produced by the partitioner, before it gets an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedJob {
    pub template: String,
    pub members: Vec<ConfigRef>,
    pub caps: DomainCaps,
    /// Byte ceiling shared by every member
    pub byte_ceiling: Option<u64>,
    pub total_expected_size: u64,
}

/// The smaller of two optional ceilings, `None` meaning unlimited
fn min_ceiling(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

/// Byte ceiling that actually applies to `config` under `caps`
pub fn effective_byte_ceiling(config: &DomainConfiguration, caps: &DomainCaps) -> Option<u64> {
    min_ceiling(config.max_bytes, caps.max_bytes)
}

/// Expected object count of `config`, capped by its effective object ceiling
pub fn expected_size(config: &DomainConfiguration, caps: &DomainCaps) -> u64 {
    match min_ceiling(config.max_objects, caps.max_objects) {
        Some(ceiling) => config.expected_size.min(ceiling),
        None => config.expected_size,
    }
}

/// Largest first: byte ceiling (unlimited highest), then expected size,
/// then domain and configuration name ascending.
pub fn compare_configs_desc(
    a: &DomainConfiguration,
    b: &DomainConfiguration,
    caps: &DomainCaps,
) -> Ordering {
    let ceiling = |c: &DomainConfiguration| effective_byte_ceiling(c, caps).unwrap_or(u64::MAX);
    ceiling(b)
        .cmp(&ceiling(a))
        .then_with(|| expected_size(b, caps).cmp(&expected_size(a, caps)))
        .then_with(|| a.domain.cmp(&b.domain))
        .then_with(|| a.name.cmp(&b.name))
}

/// Accumulates members for one job while walking a sorted bucket
struct JobBuilder {
    template: String,
    members: Vec<ConfigRef>,
    domains: BTreeSet<String>,
    byte_ceiling: Option<u64>,
    total: u64,
    min_size: u64,
    max_size: u64,
}

impl JobBuilder {
    fn start(config: &DomainConfiguration, size: u64, byte_ceiling: Option<u64>) -> Self {
        Self {
            template: config.template.clone(),
            members: vec![config.config_ref()],
            domains: BTreeSet::from([config.domain.clone()]),
            byte_ceiling,
            total: size,
            min_size: size,
            max_size: size,
        }
    }

    fn accepts(
        &self,
        config: &DomainConfiguration,
        size: u64,
        byte_ceiling: Option<u64>,
        limits: &PartitionLimits,
        count_cap: Option<usize>,
    ) -> bool {
        if self.domains.contains(&config.domain) {
            return false;
        }
        if count_cap.is_some_and(|cap| cap > 0 && self.members.len() >= cap) {
            return false;
        }
        if byte_ceiling != self.byte_ceiling {
            return false;
        }
        if self.total > 0 && self.total.saturating_add(size) > limits.max_total_job_size {
            return false;
        }
        if (self.min_size..=self.max_size).contains(&size) {
            return true;
        }

        let new_min = self.min_size.min(size);
        let new_max = self.max_size.max(size);
        if new_max - new_min <= limits.min_absolute_size_difference {
            return true;
        }
        let ratio = new_max as f64 / new_min.max(1) as f64;
        ratio <= limits.max_relative_size_difference as f64
    }

    fn add(&mut self, config: &DomainConfiguration, size: u64) {
        self.members.push(config.config_ref());
        self.domains.insert(config.domain.clone());
        self.total = self.total.saturating_add(size);
        self.min_size = self.min_size.min(size);
        self.max_size = self.max_size.max(size);
    }

    fn finish(self, caps: DomainCaps) -> PlannedJob {
        PlannedJob {
            template: self.template,
            members: self.members,
            caps,
            byte_ceiling: self.byte_ceiling,
            total_expected_size: self.total,
        }
    }
}

/// Splits configurations into jobs according to [`PartitionLimits`]
#[derive(Debug, Clone, Default)]
pub struct SizePartitioner {
    limits: PartitionLimits,
}

impl SizePartitioner {
    pub fn new(limits: PartitionLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &PartitionLimits {
        &self.limits
    }

    /// Partition the configurations of a selective harvest
    pub fn partition(&self, configs: &[DomainConfiguration], caps: &DomainCaps) -> Vec<PlannedJob> {
        self.partition_with(configs, caps, None)
    }

    /// Partition the configurations of a snapshot harvest, honoring the
    /// per-job member cap
    pub fn partition_snapshot(
        &self,
        configs: &[DomainConfiguration],
        caps: &DomainCaps,
    ) -> Vec<PlannedJob> {
        self.partition_with(configs, caps, self.limits.snapshot_config_count)
    }

    fn partition_with(
        &self,
        configs: &[DomainConfiguration],
        caps: &DomainCaps,
        count_cap: Option<usize>,
    ) -> Vec<PlannedJob> {
        let mut buckets: BTreeMap<&str, Vec<&DomainConfiguration>> = BTreeMap::new();
        for config in configs {
            if self.limits.exclude_zero_budget && has_zero_budget(config) {
                tracing::debug!(
                    domain = %config.domain,
                    config = %config.name,
                    "skipping configuration with zero budget"
                );
                continue;
            }
            buckets.entry(config.template.as_str()).or_default().push(config);
        }

        let mut jobs = Vec::new();
        for (_, mut bucket) in buckets {
            bucket.sort_by(|a, b| compare_configs_desc(a, b, caps));

            let mut current: Option<JobBuilder> = None;
            for config in bucket {
                let size = expected_size(config, caps);
                let ceiling = effective_byte_ceiling(config, caps);
                match current.as_mut() {
                    Some(job) if job.accepts(config, size, ceiling, &self.limits, count_cap) => {
                        job.add(config, size);
                    }
                    _ => {
                        if let Some(done) = current.replace(JobBuilder::start(config, size, ceiling)) {
                            jobs.push(done.finish(*caps));
                        }
                    }
                }
            }
            if let Some(done) = current {
                jobs.push(done.finish(*caps));
            }
        }
        jobs
    }
}

fn has_zero_budget(config: &DomainConfiguration) -> bool {
    config.max_bytes == Some(0) || config.max_objects == Some(0)
}

#[cfg(test)]
#[path = "partition_tests.rs"]
mod tests;
