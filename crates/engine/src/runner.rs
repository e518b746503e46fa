// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harvest runner: fires definitions into jobs and drives job status
//!
//! Every operation reads value snapshots from the store, computes the new
//! records with the pure model, and commits them in one store call. A commit
//! that loses a race with a concurrent edit is re-read and recomputed, up to
//! the configured number of attempts. Events are handed to the notifier only
//! after their commit succeeded.

use crate::config::{EngineConfig, RetryConfig};
use crate::error::RunError;
use crate::guard::FiringGuards;
use crate::notify::Notifier;
use crate::resolve::{lineage, resolve_selective, resolve_snapshot};
use chrono::{DateTime, Utc};
use hv_core::{
    Advance, Clock, Event, HarvestDefinition, HarvestError, HarvestId, IdGen, Job, JobId,
    JobStatus, PlannedJob, SizePartitioner,
};
use hv_storage::HarvestStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Runner dependencies
pub struct RunnerDeps<C, I, N> {
    pub store: Arc<HarvestStore>,
    pub clock: C,
    pub id_gen: I,
    pub notifier: N,
}

/// What a single tick did with a definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The definition fired; the jobs are stored as `New`
    Fired { jobs: Vec<Job> },
    NotDue,
    Inactive,
    /// Another firing of the same definition is in flight
    Busy,
    /// Snapshots only fire through [`HarvestRunner::run_snapshot`]
    Unscheduled,
}

impl TickOutcome {
    pub fn jobs(&self) -> &[Job] {
        match self {
            TickOutcome::Fired { jobs } => jobs,
            _ => &[],
        }
    }
}

/// A firing attempt either commits or decides there is nothing to do
enum Firing {
    Committed { jobs: Vec<Job>, events: Vec<Event> },
    Skipped(TickOutcome),
}

struct Inner<C, I, N> {
    store: Arc<HarvestStore>,
    clock: C,
    id_gen: I,
    notifier: N,
    partitioner: SizePartitioner,
    retry: RetryConfig,
    guards: FiringGuards,
}

/// Fires harvest definitions and drives their jobs
pub struct HarvestRunner<C, I, N> {
    inner: Arc<Inner<C, I, N>>,
}

impl<C, I, N> Clone for HarvestRunner<C, I, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, I, N> HarvestRunner<C, I, N>
where
    C: Clock,
    I: IdGen,
    N: Notifier,
{
    pub fn new(deps: RunnerDeps<C, I, N>, config: EngineConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: deps.store,
                clock: deps.clock,
                id_gen: deps.id_gen,
                notifier: deps.notifier,
                partitioner: SizePartitioner::new(config.partition),
                retry: config.retry,
                guards: FiringGuards::new(),
            }),
        }
    }

    pub fn store(&self) -> &HarvestStore {
        &self.inner.store
    }

    pub fn clock(&self) -> &C {
        &self.inner.clock
    }

    /// Fire a selective definition if it is due at `now`
    pub async fn tick(&self, id: &HarvestId, now: DateTime<Utc>) -> Result<TickOutcome, RunError> {
        let Some(_guard) = self.inner.guards.try_acquire(id) else {
            tracing::debug!(harvest_id = %id, "firing already in flight");
            return Ok(TickOutcome::Busy);
        };
        let firing = self.with_retry(id.as_str(), || self.fire_selective(id, now))?;
        self.finish(firing).await
    }

    /// Tick every active, due selective definition, one task each
    pub async fn tick_all(&self, now: DateTime<Utc>) -> Vec<(HarvestId, Result<TickOutcome, RunError>)> {
        let due: BTreeSet<HarvestId> = self
            .inner
            .store
            .harvests()
            .into_iter()
            .filter(|h| !h.is_snapshot() && h.is_due(now))
            .map(|h| h.id)
            .collect();
        tracing::debug!(due = due.len(), %now, "ticking due harvests");

        let mut tasks = JoinSet::new();
        for id in due.iter().cloned() {
            let runner = self.clone();
            tasks.spawn(async move {
                let result = runner.tick(&id, now).await;
                (id, result)
            });
        }

        let mut pending = due;
        let mut results = Vec::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, result)) => {
                    if let Err(e) = &result {
                        tracing::error!(harvest_id = %id, error = %e, "tick failed");
                    }
                    pending.remove(&id);
                    results.push((id, result));
                }
                Err(e) => tracing::error!(error = %e, "firing task did not complete"),
            }
        }
        for id in pending {
            results.push((id, Err(RunError::Task("firing task did not complete".to_string()))));
        }
        results.sort_by(|a, b| a.0.cmp(&b.0));
        results
    }

    /// [`Self::tick_all`] at the runner's clock
    pub async fn tick_due(&self) -> Vec<(HarvestId, Result<TickOutcome, RunError>)> {
        self.tick_all(self.inner.clock.now()).await
    }

    /// Fire a snapshot definition once, then deactivate it
    pub async fn run_snapshot(&self, id: &HarvestId, now: DateTime<Utc>) -> Result<TickOutcome, RunError> {
        let Some(_guard) = self.inner.guards.try_acquire(id) else {
            tracing::debug!(harvest_id = %id, "firing already in flight");
            return Ok(TickOutcome::Busy);
        };
        let firing = self.with_retry(id.as_str(), || self.fire_snapshot(id, now))?;
        self.finish(firing).await
    }

    /// Replace a failed job by a fresh `New` copy; returns the copy
    pub async fn resubmit(&self, job_id: &JobId, now: DateTime<Utc>) -> Result<Job, RunError> {
        let (fresh, events) = self.with_retry(job_id.as_str(), || {
            let job = self.inner.store.job(job_id)?;
            let (old, fresh, events) = job.resubmit(self.inner.id_gen.next_as(), now)?;
            let (_, fresh) = self.inner.store.commit_resubmission(old, fresh)?;
            Ok((fresh, events))
        })?;
        tracing::info!(job_id = %job_id, new_job_id = %fresh.id, "resubmitted job");
        self.publish(&events).await;
        Ok(fresh)
    }

    /// Mark a failed job as not to be retried
    pub async fn reject(&self, job_id: &JobId) -> Result<Job, RunError> {
        self.record_status(job_id, JobStatus::FailedRejected, self.inner.clock.now())
            .await
    }

    /// Undo [`Self::reject`]
    pub async fn unreject(&self, job_id: &JobId) -> Result<Job, RunError> {
        self.record_status(job_id, JobStatus::Failed, self.inner.clock.now())
            .await
    }

    /// Apply a status reported for a job, e.g. by the crawler
    pub async fn record_status(
        &self,
        job_id: &JobId,
        status: JobStatus,
        at: DateTime<Utc>,
    ) -> Result<Job, RunError> {
        let (job, events) = self.with_retry(job_id.as_str(), || {
            let (mut job, events) = self.inner.store.job(job_id)?.transition(status, at)?;
            job.edition = self.inner.store.update_job(job.clone())?;
            Ok((job, events))
        })?;
        tracing::info!(job_id = %job_id, %status, "job status changed");
        self.publish(&events).await;
        Ok(job)
    }

    /// Restart a selective definition's schedule from `now`
    pub async fn reset(&self, id: &HarvestId, now: DateTime<Utc>) -> Result<HarvestDefinition, RunError> {
        let harvest = self.with_retry(id.as_str(), || {
            let harvest = self.inner.store.harvest(id)?;
            let name = harvest.schedule_name().ok_or_else(|| {
                HarvestError::IllegalState(format!("snapshot harvest {} has no schedule to reset", id))
            })?;
            let schedule = self.inner.store.schedule(name)?;
            let mut reset = harvest.reset(&schedule, now)?;
            reset.edition = self.inner.store.update_harvest(reset.clone())?;
            Ok(reset)
        })?;
        tracing::info!(harvest_id = %id, next_fire_time = ?harvest.next_fire_time, "reset harvest");
        Ok(harvest)
    }

    fn fire_selective(&self, id: &HarvestId, now: DateTime<Utc>) -> Result<Firing, RunError> {
        let store = &self.inner.store;
        let harvest = store.harvest(id)?;
        if !harvest.active {
            return Ok(Firing::Skipped(TickOutcome::Inactive));
        }
        let Some(schedule_name) = harvest.schedule_name() else {
            return Ok(Firing::Skipped(TickOutcome::Unscheduled));
        };
        if !harvest.is_due(now) {
            return Ok(Firing::Skipped(TickOutcome::NotDue));
        }

        let schedule = store.schedule(schedule_name)?;
        let configs = resolve_selective(&harvest, &store.domains())?;
        let plans = self.inner.partitioner.partition(&configs, &harvest.caps());
        let Advance { definition, skipped } = harvest.advance(&schedule, now)?;

        let jobs = self.build_jobs(&harvest, definition.num_events, plans, now);
        let (stored, jobs) = store.commit_firing(definition, jobs)?;

        let mut events = fired_events(&stored, &jobs);
        if skipped > 0 {
            tracing::warn!(harvest_id = %id, skipped, "skipped events that were already past");
            events.push(Event::EventsSkipped {
                harvest_id: id.clone(),
                skipped,
            });
        }
        if stored.next_fire_time.is_none() {
            tracing::info!(harvest_id = %id, num_events = stored.num_events, "schedule exhausted");
            events.push(Event::HarvestExhausted {
                harvest_id: id.clone(),
            });
        }
        tracing::info!(
            harvest_id = %id,
            num_events = stored.num_events,
            jobs = jobs.len(),
            next_fire_time = ?stored.next_fire_time,
            "fired harvest"
        );
        Ok(Firing::Committed { jobs, events })
    }

    fn fire_snapshot(&self, id: &HarvestId, now: DateTime<Utc>) -> Result<Firing, RunError> {
        let store = &self.inner.store;
        let harvest = store.harvest(id)?;
        if !harvest.is_snapshot() {
            return Err(HarvestError::IllegalState(format!("harvest {} is not a snapshot", id)).into());
        }
        if !harvest.active {
            return Ok(Firing::Skipped(TickOutcome::Inactive));
        }

        let lineage = lineage(store, &harvest);
        let configs = resolve_snapshot(&store.domains(), &lineage)?;
        let plans = self
            .inner
            .partitioner
            .partition_snapshot(&configs, &harvest.caps());
        let definition = harvest.complete_snapshot()?;

        let jobs = self.build_jobs(&harvest, definition.num_events, plans, now);
        let (stored, jobs) = store.commit_firing(definition, jobs)?;
        tracing::info!(
            harvest_id = %id,
            incremental = !lineage.is_empty(),
            domains = configs.len(),
            jobs = jobs.len(),
            "ran snapshot harvest"
        );
        let events = fired_events(&stored, &jobs);
        Ok(Firing::Committed { jobs, events })
    }

    fn build_jobs(
        &self,
        harvest: &HarvestDefinition,
        harvest_num: u32,
        plans: Vec<PlannedJob>,
        now: DateTime<Utc>,
    ) -> Vec<Job> {
        plans
            .into_iter()
            .map(|plan| Job::from_plan(self.inner.id_gen.next_as(), harvest, harvest_num, plan, now))
            .collect()
    }

    async fn finish(&self, firing: Firing) -> Result<TickOutcome, RunError> {
        match firing {
            Firing::Skipped(outcome) => Ok(outcome),
            Firing::Committed { jobs, events } => {
                self.publish(&events).await;
                Ok(TickOutcome::Fired { jobs })
            }
        }
    }

    /// Re-run `attempt` while it fails on a stale write
    fn with_retry<T>(
        &self,
        record: &str,
        mut attempt: impl FnMut() -> Result<T, RunError>,
    ) -> Result<T, RunError> {
        let max_attempts = self.inner.retry.max_attempts.max(1);
        for n in 1..=max_attempts {
            match attempt() {
                Err(e) if e.is_stale() => {
                    tracing::warn!(record, attempt = n, max_attempts, error = %e, "stale write, re-reading");
                }
                other => return other,
            }
        }
        Err(RunError::RetriesExhausted {
            target: record.to_string(),
            attempts: max_attempts,
        })
    }

    /// Deliver committed events; delivery failures are only logged
    async fn publish(&self, events: &[Event]) {
        for event in events {
            if let Err(e) = self.inner.notifier.notify(event).await {
                tracing::warn!(event = event.name(), error = %e, "failed to deliver event");
            }
        }
    }
}

fn fired_events(harvest: &HarvestDefinition, jobs: &[Job]) -> Vec<Event> {
    let mut events: Vec<Event> = jobs
        .iter()
        .map(|job| Event::JobCreated {
            job_id: job.id.clone(),
            harvest_id: harvest.id.clone(),
        })
        .collect();
    events.push(Event::HarvestFired {
        harvest_id: harvest.id.clone(),
        num_events: harvest.num_events,
        jobs: jobs.iter().map(|job| job.id.clone()).collect(),
    });
    events
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
