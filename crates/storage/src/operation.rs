// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Committed mutations, as written to the log

use hv_core::{Domain, HarvestDefinition, HarvestId, Job, Schedule};
use serde::{Deserialize, Serialize};

/// One committed mutation.
///
/// Records are carried in their stored form (edition already bumped), so
/// applying an operation never needs to re-run validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    SchedulePut { schedule: Schedule },
    ScheduleDelete { name: String },
    DomainPut { domain: Domain },
    DomainDelete { name: String },
    HarvestPut { harvest: HarvestDefinition },
    /// Remove a definition; `purge` also drops its jobs
    HarvestDelete { id: HarvestId, purge: bool },
    JobsPut { jobs: Vec<Job> },
    /// A firing: the advanced definition and every job it produced
    FiringCommit {
        harvest: HarvestDefinition,
        jobs: Vec<Job>,
    },
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::SchedulePut { .. } => "schedule:put",
            Operation::ScheduleDelete { .. } => "schedule:delete",
            Operation::DomainPut { .. } => "domain:put",
            Operation::DomainDelete { .. } => "domain:delete",
            Operation::HarvestPut { .. } => "harvest:put",
            Operation::HarvestDelete { .. } => "harvest:delete",
            Operation::JobsPut { .. } => "jobs:put",
            Operation::FiringCommit { .. } => "firing:commit",
        }
    }
}
