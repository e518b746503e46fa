// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The harvest store: all tables behind one lock, with an optional log
//!
//! Every mutation is validated against the current state first, then
//! appended to the WAL, then applied in memory. A failed validation or log
//! write leaves the state untouched. The store never retries; callers that
//! see a stale write re-read and decide for themselves.

use crate::error::StoreError;
use crate::operation::Operation;
use crate::state::MaterializedState;
use crate::wal::Wal;
use hv_core::{Domain, HarvestDefinition, HarvestError, HarvestId, Job, JobId, Schedule};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

/// File name of the log inside a store directory
pub const WAL_FILE: &str = "harvest.wal";

struct Inner {
    state: MaterializedState,
    wal: Option<Wal>,
}

impl Inner {
    fn commit(&mut self, op: Operation) -> Result<(), StoreError> {
        if let Some(wal) = self.wal.as_mut() {
            let seq = wal.append(&op)?;
            tracing::trace!(seq, op = op.name(), "appended to WAL");
        }
        self.state.apply(&op);
        Ok(())
    }
}

pub struct HarvestStore {
    inner: Mutex<Inner>,
}

impl Default for HarvestStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl HarvestStore {
    /// A store that keeps nothing on disk
    pub fn in_memory() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: MaterializedState::default(),
                wal: None,
            }),
        }
    }

    /// Open a durable store in `dir`, replaying its log
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let (wal, ops) = Wal::open(&dir.join(WAL_FILE))?;
        let mut state = MaterializedState::default();
        for op in &ops {
            state.apply(op);
        }
        tracing::info!(
            dir = %dir.display(),
            operations = ops.len(),
            harvests = state.harvests.len(),
            jobs = state.jobs.len(),
            "opened harvest store"
        );
        Ok(Self {
            inner: Mutex::new(Inner {
                state,
                wal: Some(wal),
            }),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Schedules

    pub fn insert_schedule(&self, schedule: Schedule) -> Result<Schedule, StoreError> {
        schedule.validate()?;
        let mut inner = self.lock();
        let stored = inner.state.schedules.prepare_insert(schedule)?;
        inner.commit(Operation::SchedulePut {
            schedule: stored.clone(),
        })?;
        Ok(stored)
    }

    pub fn schedule(&self, name: &str) -> Result<Schedule, StoreError> {
        self.lock().state.schedules.snapshot(&name.to_string())
    }

    pub fn schedules(&self) -> Vec<Schedule> {
        self.lock().state.schedules.values().cloned().collect()
    }

    pub fn update_schedule(&self, schedule: Schedule) -> Result<u64, StoreError> {
        schedule.validate()?;
        let mut inner = self.lock();
        let stored = inner.state.schedules.prepare_update(schedule)?;
        let edition = stored.edition;
        inner.commit(Operation::SchedulePut { schedule: stored })?;
        Ok(edition)
    }

    /// Delete a schedule no definition refers to
    pub fn delete_schedule(&self, name: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.state.schedules.snapshot(&name.to_string())?;
        if let Some(user) = inner
            .state
            .harvests
            .values()
            .find(|h| h.schedule_name() == Some(name))
        {
            return Err(StoreError::PermissionDenied(format!(
                "schedule {} is used by harvest {}",
                name, user.id
            )));
        }
        inner.commit(Operation::ScheduleDelete {
            name: name.to_string(),
        })
    }

    // Domains

    pub fn insert_domain(&self, domain: Domain) -> Result<Domain, StoreError> {
        domain.validate()?;
        let mut inner = self.lock();
        check_alias_chain(&inner.state, &domain)?;
        let stored = inner.state.domains.prepare_insert(domain)?;
        inner.commit(Operation::DomainPut {
            domain: stored.clone(),
        })?;
        Ok(stored)
    }

    pub fn domain(&self, name: &str) -> Result<Domain, StoreError> {
        self.lock().state.domains.snapshot(&name.to_string())
    }

    pub fn domains(&self) -> Vec<Domain> {
        self.lock().state.domains.values().cloned().collect()
    }

    /// Update a domain; removing a configuration a selective harvest uses
    /// is refused
    pub fn update_domain(&self, domain: Domain) -> Result<u64, StoreError> {
        domain.validate()?;
        let mut inner = self.lock();
        check_alias_chain(&inner.state, &domain)?;
        if let Some(current) = inner.state.domains.get(&domain.name) {
            for config in &current.configurations {
                if domain.configuration(&config.name).is_err() {
                    check_config_unused(&inner.state, &domain.name, &config.name)?;
                }
            }
        }
        let stored = inner.state.domains.prepare_update(domain)?;
        let edition = stored.edition;
        inner.commit(Operation::DomainPut { domain: stored })?;
        Ok(edition)
    }

    pub fn delete_domain(&self, name: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let domain = inner.state.domains.snapshot(&name.to_string())?;
        for config in &domain.configurations {
            check_config_unused(&inner.state, name, &config.name)?;
        }
        inner.commit(Operation::DomainDelete {
            name: name.to_string(),
        })
    }

    // Harvest definitions

    /// Insert a definition whose schedule and members already exist
    pub fn insert_harvest(&self, harvest: HarvestDefinition) -> Result<HarvestDefinition, StoreError> {
        harvest.validate()?;
        let mut inner = self.lock();
        check_references(&inner.state, &harvest)?;
        let stored = inner.state.harvests.prepare_insert(harvest)?;
        inner.commit(Operation::HarvestPut {
            harvest: stored.clone(),
        })?;
        Ok(stored)
    }

    pub fn harvest(&self, id: &HarvestId) -> Result<HarvestDefinition, StoreError> {
        self.lock().state.harvests.snapshot(id)
    }

    pub fn harvests(&self) -> Vec<HarvestDefinition> {
        self.lock().state.harvests.values().cloned().collect()
    }

    pub fn update_harvest(&self, harvest: HarvestDefinition) -> Result<u64, StoreError> {
        harvest.validate()?;
        let mut inner = self.lock();
        check_references(&inner.state, &harvest)?;
        let stored = inner.state.harvests.prepare_update(harvest)?;
        let edition = stored.edition;
        inner.commit(Operation::HarvestPut { harvest: stored })?;
        Ok(edition)
    }

    /// Delete a definition that has never produced jobs
    pub fn delete_harvest(&self, id: &HarvestId) -> Result<(), StoreError> {
        let mut inner = self.lock();
        inner.state.harvests.snapshot(id)?;
        if let Some(job) = inner.state.jobs_for(id).next() {
            return Err(StoreError::PermissionDenied(format!(
                "harvest {} is referenced by job {}",
                id, job.id
            )));
        }
        inner.commit(Operation::HarvestDelete {
            id: id.clone(),
            purge: false,
        })
    }

    /// Delete a definition together with its jobs; returns the job count
    pub fn purge_harvest(&self, id: &HarvestId) -> Result<usize, StoreError> {
        let mut inner = self.lock();
        inner.state.harvests.snapshot(id)?;
        let removed = inner.state.jobs_for(id).count();
        inner.commit(Operation::HarvestDelete {
            id: id.clone(),
            purge: true,
        })?;
        tracing::info!(harvest_id = %id, jobs = removed, "purged harvest");
        Ok(removed)
    }

    // Jobs

    pub fn job(&self, id: &JobId) -> Result<Job, StoreError> {
        self.lock().state.jobs.snapshot(id)
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.lock().state.jobs.values().cloned().collect()
    }

    pub fn jobs_for(&self, harvest_id: &HarvestId) -> Vec<Job> {
        self.lock().state.jobs_for(harvest_id).cloned().collect()
    }

    pub fn update_job(&self, job: Job) -> Result<u64, StoreError> {
        let mut inner = self.lock();
        let stored = inner.state.jobs.prepare_update(job)?;
        let edition = stored.edition;
        inner.commit(Operation::JobsPut { jobs: vec![stored] })?;
        Ok(edition)
    }

    /// Freeze a resubmitted job and store its replacement, atomically
    pub fn commit_resubmission(&self, old: Job, fresh: Job) -> Result<(Job, Job), StoreError> {
        let mut inner = self.lock();
        let old = inner.state.jobs.prepare_update(old)?;
        let fresh = inner.state.jobs.prepare_insert(fresh)?;
        inner.commit(Operation::JobsPut {
            jobs: vec![old.clone(), fresh.clone()],
        })?;
        Ok((old, fresh))
    }

    /// Store the advanced definition and every job of one firing.
    ///
    /// `harvest` must carry the edition that was read before firing; any
    /// concurrent change to the definition makes the whole firing fail with
    /// a stale write and nothing is stored.
    pub fn commit_firing(
        &self,
        harvest: HarvestDefinition,
        jobs: Vec<Job>,
    ) -> Result<(HarvestDefinition, Vec<Job>), StoreError> {
        let mut inner = self.lock();
        let harvest = inner.state.harvests.prepare_update(harvest)?;

        let mut stored = Vec::with_capacity(jobs.len());
        for job in jobs {
            if job.harvest_id != harvest.id {
                return Err(StoreError::Invalid(hv_core::HarvestError::invalid(format!(
                    "job {} belongs to harvest {}, not {}",
                    job.id, job.harvest_id, harvest.id
                ))));
            }
            if stored.iter().any(|s: &Job| s.id == job.id) {
                return Err(StoreError::Duplicate {
                    kind: "job",
                    id: job.id.to_string(),
                });
            }
            stored.push(inner.state.jobs.prepare_insert(job)?);
        }

        inner.commit(Operation::FiringCommit {
            harvest: harvest.clone(),
            jobs: stored.clone(),
        })?;
        Ok((harvest, stored))
    }
}

/// Refuse to drop a configuration a selective harvest still uses
fn check_config_unused(state: &MaterializedState, domain: &str, config: &str) -> Result<(), StoreError> {
    match state
        .harvests
        .values()
        .find(|h| h.uses_configuration(domain, config))
    {
        Some(user) => Err(StoreError::PermissionDenied(format!(
            "configuration {}/{} is used by harvest {}",
            domain, config, user.id
        ))),
        None => Ok(()),
    }
}

/// Following `alias_of` links from `domain` must never lead back to it
fn check_alias_chain(state: &MaterializedState, domain: &Domain) -> Result<(), StoreError> {
    let mut seen = HashSet::from([domain.name.as_str()]);
    let mut next = domain.alias_of.as_deref();
    while let Some(name) = next {
        if !seen.insert(name) {
            return Err(HarvestError::IllegalState(format!(
                "domain {} would be an alias of itself through {}",
                domain.name, name
            ))
            .into());
        }
        next = state
            .domains
            .get(&name.to_string())
            .and_then(|d| d.alias_of.as_deref());
    }
    Ok(())
}

/// A definition's schedule, members and previous snapshot must exist
fn check_references(state: &MaterializedState, harvest: &HarvestDefinition) -> Result<(), StoreError> {
    if let Some(name) = harvest.schedule_name() {
        state.schedules.snapshot(&name.to_string())?;
    }
    for member in harvest.members() {
        let domain = state.domains.snapshot(&member.domain)?;
        domain
            .configuration(&member.config)
            .map_err(|_| StoreError::NotFound {
                kind: "configuration",
                id: member.to_string(),
            })?;
    }
    if let Some(previous) = harvest.previous_snapshot() {
        state.harvests.snapshot(previous)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
