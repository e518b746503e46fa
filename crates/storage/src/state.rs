// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use crate::operation::Operation;
use crate::table::OptimisticStore;
use hv_core::{Domain, HarvestDefinition, HarvestId, Job, Schedule};

/// Every table of the harvest store
#[derive(Debug, Clone, Default)]
pub struct MaterializedState {
    pub schedules: OptimisticStore<Schedule>,
    pub domains: OptimisticStore<Domain>,
    pub harvests: OptimisticStore<HarvestDefinition>,
    pub jobs: OptimisticStore<Job>,
}

impl MaterializedState {
    /// Jobs produced by the given harvest
    pub fn jobs_for<'a>(&'a self, harvest_id: &'a HarvestId) -> impl Iterator<Item = &'a Job> + 'a {
        self.jobs.values().filter(move |job| &job.harvest_id == harvest_id)
    }

    /// Apply a committed operation
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::SchedulePut { schedule } => self.schedules.put(schedule.clone()),

            Operation::ScheduleDelete { name } => {
                self.schedules.remove(name);
            }

            Operation::DomainPut { domain } => self.domains.put(domain.clone()),

            Operation::DomainDelete { name } => {
                self.domains.remove(name);
            }

            Operation::HarvestPut { harvest } => self.harvests.put(harvest.clone()),

            Operation::HarvestDelete { id, purge } => {
                self.harvests.remove(id);
                if *purge {
                    let doomed: Vec<_> = self.jobs_for(id).map(|job| job.id.clone()).collect();
                    for job_id in doomed {
                        self.jobs.remove(&job_id);
                    }
                }
            }

            Operation::JobsPut { jobs } => {
                for job in jobs {
                    self.jobs.put(job.clone());
                }
            }

            Operation::FiringCommit { harvest, jobs } => {
                self.harvests.put(harvest.clone());
                for job in jobs {
                    self.jobs.put(job.clone());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
