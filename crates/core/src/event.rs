// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events emitted by firings and job transitions

use crate::harvest::HarvestId;
use crate::job::{JobId, JobStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Observable side effects of harvest operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A definition fired and produced jobs
    HarvestFired {
        harvest_id: HarvestId,
        num_events: u32,
        jobs: Vec<JobId>,
    },

    /// The schedule has no further events
    HarvestExhausted { harvest_id: HarvestId },

    /// Past events were skipped while catching up
    EventsSkipped { harvest_id: HarvestId, skipped: u32 },

    JobCreated { job_id: JobId, harvest_id: HarvestId },

    JobStatusChanged {
        job_id: JobId,
        from: JobStatus,
        to: JobStatus,
    },

    /// A failed job was replaced by a fresh copy
    JobResubmitted { job_id: JobId, new_job_id: JobId },

    /// The crawler reported a stop time before the start time
    JobTimingInconsistent {
        job_id: JobId,
        started_at: DateTime<Utc>,
        stopped_at: DateTime<Utc>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::HarvestFired { .. } => "harvest:fired",
            Event::HarvestExhausted { .. } => "harvest:exhausted",
            Event::EventsSkipped { .. } => "harvest:skipped",
            Event::JobCreated { .. } => "job:created",
            Event::JobStatusChanged { .. } => "job:status",
            Event::JobResubmitted { .. } => "job:resubmitted",
            Event::JobTimingInconsistent { .. } => "job:timing",
        }
    }

    /// Whether the event signals something an operator should look at
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::EventsSkipped { .. } | Event::JobTimingInconsistent { .. }
        )
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
