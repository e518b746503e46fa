// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hv jobs`: inspect jobs and record their progress

use super::App;
use crate::output;
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Subcommand;
use hv_core::{Clock, HarvestId, Job, JobId, JobStatus};
use serde::Serialize;
use std::fmt;

#[derive(Subcommand)]
pub enum JobsCommand {
    /// List jobs
    List {
        /// Only jobs of this harvest
        #[arg(long)]
        harvest: Option<String>,
    },
    /// Record a status reported for a job
    Set {
        id: String,
        /// new, submitted, started, done, failed or failed_rejected
        status: JobStatus,
        /// When the status was reached (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Replace a failed job by a fresh copy
    Resubmit { id: String },
    /// Mark a failed job as not to be retried
    Reject { id: String },
    /// Undo a rejection
    Unreject { id: String },
}

#[derive(Serialize)]
struct JobRow {
    id: String,
    harvest_id: String,
    harvest_num: u32,
    status: JobStatus,
    template: String,
    members: usize,
    total_expected_size: u64,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.to_string(),
            harvest_id: job.harvest_id.to_string(),
            harvest_num: job.harvest_num,
            status: job.status,
            template: job.template.clone(),
            members: job.members.len(),
            total_expected_size: job.total_expected_size,
        }
    }
}

impl fmt::Display for JobRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<38} {:<12} #{:<4} {:<16} {:<20} {:>4} {:>10}",
            self.id,
            self.harvest_id,
            self.harvest_num,
            self.status.to_string(),
            self.template,
            self.members,
            self.total_expected_size
        )
    }
}

pub async fn handle(app: &App, command: JobsCommand) -> Result<()> {
    let runner = app.runner();
    let job = match command {
        JobsCommand::List { harvest } => {
            let jobs = match harvest {
                Some(id) => app.store.jobs_for(&HarvestId::new(id)),
                None => app.store.jobs(),
            };
            let rows: Vec<JobRow> = jobs.iter().map(JobRow::from).collect();
            return output::print_list(&rows, "No jobs", app.format);
        }
        JobsCommand::Set { id, status, at } => {
            let at = at.unwrap_or_else(|| runner.clock().now());
            runner.record_status(&JobId::new(id), status, at).await?
        }
        JobsCommand::Resubmit { id } => {
            let now = runner.clock().now();
            runner.resubmit(&JobId::new(id), now).await?
        }
        JobsCommand::Reject { id } => runner.reject(&JobId::new(id)).await?,
        JobsCommand::Unreject { id } => runner.unreject(&JobId::new(id)).await?,
    };
    output::print(&JobRow::from(&job), app.format)
}
