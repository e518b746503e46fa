// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harvest history and the incremental snapshot filter

use crate::domain::{Domain, DomainConfiguration};
use crate::harvest::HarvestId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why the crawler stopped harvesting a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    DownloadComplete,
    /// Harvest-wide object cap reached
    ObjectLimit,
    /// Harvest-wide byte cap reached
    SizeLimit,
    /// The configuration's own object ceiling reached
    ConfigObjectLimit,
    /// The configuration's own byte ceiling reached
    ConfigSizeLimit,
    TimeLimit,
    DownloadUnfinished,
}

/// Outcome of harvesting one domain within one harvest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestInfo {
    pub harvest_id: HarvestId,
    pub domain: String,
    pub config: String,
    pub date: DateTime<Utc>,
    pub count_objects: u64,
    pub size_bytes: u64,
    pub stop_reason: StopReason,
}

impl HarvestInfo {
    /// Whether this outcome needs no continuation under `config`.
    ///
    /// A stop on the configuration's own ceiling only counts while that
    /// ceiling is still reached by what was harvested; raising or removing
    /// the ceiling makes the domain eligible again.
    pub fn is_complete(&self, config: &DomainConfiguration) -> bool {
        match self.stop_reason {
            StopReason::DownloadComplete => true,
            StopReason::ConfigSizeLimit => config
                .max_bytes
                .is_some_and(|limit| self.size_bytes >= limit),
            StopReason::ConfigObjectLimit => config
                .max_objects
                .is_some_and(|limit| self.count_objects >= limit),
            StopReason::ObjectLimit
            | StopReason::SizeLimit
            | StopReason::TimeLimit
            | StopReason::DownloadUnfinished => false,
        }
    }
}

/// Whether an incremental snapshot should skip `domain`.
///
/// Only the most recent outcome within `lineage` (the chain of previous
/// snapshots) counts. Never-attempted domains are kept.
pub fn finished_in_lineage(
    domain: &Domain,
    config: &DomainConfiguration,
    lineage: &[HarvestId],
) -> bool {
    domain
        .latest_harvest_in(lineage)
        .is_some_and(|info| info.is_complete(config))
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
