// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job state machine
//!
//! ```text
//! New -> Submitted -> Started -> Done
//!                            \-> Failed -> Resubmitted
//!                                      <-> FailedRejected
//! ```

use crate::error::HarvestError;
use crate::event::Event;
use crate::harvest::{ConfigRef, HarvestDefinition, HarvestId};
use crate::partition::{DomainCaps, PlannedJob};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    New,
    Submitted,
    Started,
    Done,
    Failed,
    /// Replaced by a fresh copy; frozen from then on
    Resubmitted,
    /// Failure acknowledged by an operator and not to be retried
    FailedRejected,
}

impl JobStatus {
    pub fn can_transition_to(&self, to: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (*self, to),
            (New, Submitted)
                | (Submitted, Started)
                | (Started, Done)
                | (Started, Failed)
                | (Failed, Resubmitted)
                | (Failed, FailedRejected)
                | (FailedRejected, Failed)
        )
    }

    /// No transition leaves this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Resubmitted)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::New => "new",
            JobStatus::Submitted => "submitted",
            JobStatus::Started => "started",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
            JobStatus::Resubmitted => "resubmitted",
            JobStatus::FailedRejected => "failed_rejected",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(JobStatus::New),
            "submitted" => Ok(JobStatus::Submitted),
            "started" => Ok(JobStatus::Started),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            "resubmitted" => Ok(JobStatus::Resubmitted),
            "failed_rejected" => Ok(JobStatus::FailedRejected),
            _ => Err(format!("unknown job status: {}", s)),
        }
    }
}

/// A bounded unit of crawl work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub harvest_id: HarvestId,
    /// Which firing of the harvest produced this job
    pub harvest_num: u32,
    pub template: String,
    pub members: Vec<ConfigRef>,
    pub caps: DomainCaps,
    #[serde(default)]
    pub byte_ceiling: Option<u64>,
    pub total_expected_size: u64,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resubmitted_as: Option<JobId>,
    #[serde(default)]
    pub edition: u64,
}

impl Job {
    /// Materialize a planned job for the given firing of `harvest`
    pub fn from_plan(
        id: JobId,
        harvest: &HarvestDefinition,
        harvest_num: u32,
        plan: PlannedJob,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            harvest_id: harvest.id.clone(),
            harvest_num,
            template: plan.template,
            members: plan.members,
            caps: plan.caps,
            byte_ceiling: plan.byte_ceiling,
            total_expected_size: plan.total_expected_size,
            status: JobStatus::New,
            created_at: now,
            submitted_at: None,
            started_at: None,
            stopped_at: None,
            resubmitted_as: None,
            edition: 0,
        }
    }

    pub fn includes_domain(&self, domain: &str) -> bool {
        self.members.iter().any(|m| m.domain == domain)
    }

    /// Move to `to` at `at`, stamping the matching timestamp.
    ///
    /// Illegal moves leave the job untouched. Resubmission goes through
    /// [`Job::resubmit`] since it needs a replacement identity.
    pub fn transition(
        &self,
        to: JobStatus,
        at: DateTime<Utc>,
    ) -> Result<(Job, Vec<Event>), HarvestError> {
        if to == JobStatus::Resubmitted {
            return Err(HarvestError::IllegalState(format!(
                "job {} can only be resubmitted with a replacement",
                self.id
            )));
        }
        self.apply(to, at)
    }

    /// Replace a failed job with a fresh copy in `New`.
    ///
    /// Returns the frozen original, its replacement and the events.
    pub fn resubmit(
        &self,
        new_id: JobId,
        at: DateTime<Utc>,
    ) -> Result<(Job, Job, Vec<Event>), HarvestError> {
        let (mut old, mut events) = self.apply(JobStatus::Resubmitted, at)?;
        old.resubmitted_as = Some(new_id.clone());

        let fresh = Job {
            id: new_id.clone(),
            status: JobStatus::New,
            created_at: at,
            submitted_at: None,
            started_at: None,
            stopped_at: None,
            resubmitted_as: None,
            edition: 0,
            ..self.clone()
        };

        events.push(Event::JobResubmitted {
            job_id: self.id.clone(),
            new_job_id: new_id,
        });
        events.push(Event::JobCreated {
            job_id: fresh.id.clone(),
            harvest_id: fresh.harvest_id.clone(),
        });
        Ok((old, fresh, events))
    }

    fn apply(&self, to: JobStatus, at: DateTime<Utc>) -> Result<(Job, Vec<Event>), HarvestError> {
        if !self.status.can_transition_to(to) {
            return Err(HarvestError::IllegalState(format!(
                "job {} cannot move from {} to {}",
                self.id, self.status, to
            )));
        }

        let mut job = self.clone();
        job.status = to;
        let mut events = vec![Event::JobStatusChanged {
            job_id: self.id.clone(),
            from: self.status,
            to,
        }];

        match to {
            JobStatus::Submitted => job.submitted_at = Some(at),
            JobStatus::Started => job.started_at = Some(at),
            JobStatus::Done | JobStatus::Failed if self.status == JobStatus::Started => {
                job.stopped_at = Some(at);
                if let Some(started_at) = job.started_at {
                    if at < started_at {
                        tracing::warn!(
                            job_id = %job.id,
                            %started_at,
                            stopped_at = %at,
                            "job stopped before it started"
                        );
                        events.push(Event::JobTimingInconsistent {
                            job_id: job.id.clone(),
                            started_at,
                            stopped_at: at,
                        });
                    }
                }
            }
            _ => {}
        }

        Ok((job, events))
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
