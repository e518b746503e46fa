// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hv tick`, `hv snapshot` and `hv reset`: firing harvests

use super::App;
use crate::output;
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use hv_core::{Clock, HarvestId};
use hv_engine::{RunError, TickOutcome};
use serde::Serialize;
use std::fmt;

#[derive(Args)]
pub struct TickArgs {
    /// Tick as of this time (RFC 3339); defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Args)]
pub struct SnapshotArgs {
    /// Snapshot harvest to run
    pub id: String,
    /// Run as of this time (RFC 3339); defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Args)]
pub struct ResetArgs {
    /// Selective harvest to reset
    pub id: String,
    /// Restart the schedule from this time (RFC 3339); defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
struct TickReport {
    harvest_id: String,
    outcome: &'static str,
    jobs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TickReport {
    fn new(id: &HarvestId, result: &Result<TickOutcome, RunError>) -> Self {
        let (outcome, error) = match result {
            Ok(TickOutcome::Fired { .. }) => ("fired", None),
            Ok(TickOutcome::NotDue) => ("not_due", None),
            Ok(TickOutcome::Inactive) => ("inactive", None),
            Ok(TickOutcome::Busy) => ("busy", None),
            Ok(TickOutcome::Unscheduled) => ("unscheduled", None),
            Err(e) => ("failed", Some(e.to_string())),
        };
        let jobs = match result {
            Ok(outcome) => outcome.jobs().iter().map(|j| j.id.to_string()).collect(),
            Err(_) => Vec::new(),
        };
        Self {
            harvest_id: id.to_string(),
            outcome,
            jobs,
            error,
        }
    }
}

impl fmt::Display for TickReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, self.outcome) {
            (Some(error), _) => write!(f, "{}: failed: {}", self.harvest_id, error),
            (None, "fired") => write!(
                f,
                "{}: fired {} job(s) {}",
                self.harvest_id,
                self.jobs.len(),
                self.jobs.join(" ")
            ),
            (None, outcome) => write!(f, "{}: {}", self.harvest_id, outcome.replace('_', " ")),
        }
    }
}

pub async fn tick(app: &App, args: TickArgs) -> Result<()> {
    let runner = app.runner();
    let at = args.at.unwrap_or_else(|| runner.clock().now());
    let results = runner.tick_all(at).await;

    let reports: Vec<TickReport> = results
        .iter()
        .map(|(id, result)| TickReport::new(id, result))
        .collect();
    output::print_list(&reports, "No harvests due", app.format)?;

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        bail!("{} harvest(s) failed to fire", failed);
    }
    Ok(())
}

pub async fn snapshot(app: &App, args: SnapshotArgs) -> Result<()> {
    let runner = app.runner();
    let at = args.at.unwrap_or_else(|| runner.clock().now());
    let id = HarvestId::new(args.id);
    let result = runner.run_snapshot(&id, at).await;
    output::print(&TickReport::new(&id, &result), app.format)?;
    result?;
    Ok(())
}

pub async fn reset(app: &App, args: ResetArgs) -> Result<()> {
    let runner = app.runner();
    let at = args.at.unwrap_or_else(|| runner.clock().now());
    let harvest = runner.reset(&HarvestId::new(args.id), at).await?;
    match harvest.next_fire_time {
        Some(next) => println!("{}: next firing at {}", harvest.id, next.to_rfc3339()),
        None => println!("{}: schedule has no further events", harvest.id),
    }
    Ok(())
}
