// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hv schedule`: list the upcoming events of a schedule

use super::App;
use crate::output;
use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use std::fmt;

#[derive(Args)]
pub struct ScheduleArgs {
    /// Schedule name
    pub name: String,
    /// Start listing from this time (RFC 3339); defaults to now
    #[arg(long)]
    pub from: Option<DateTime<Utc>>,
    /// Number of events to list
    #[arg(long, default_value_t = 5)]
    pub count: usize,
}

#[derive(Serialize)]
struct Upcoming {
    schedule: String,
    frequency: String,
    events: Vec<DateTime<Utc>>,
}

impl fmt::Display for Upcoming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.schedule, self.frequency)?;
        if self.events.is_empty() {
            write!(f, "\n  no further events")?;
        }
        for event in &self.events {
            write!(f, "\n  {}", event.to_rfc3339())?;
        }
        Ok(())
    }
}

pub fn handle(app: &App, args: ScheduleArgs) -> Result<()> {
    let schedule = app.store.schedule(&args.name)?;
    let from = args.from.unwrap_or_else(Utc::now);
    let upcoming = Upcoming {
        frequency: schedule.frequency.to_string(),
        events: schedule.upcoming(from, args.count)?,
        schedule: schedule.name,
    };
    output::print(&upcoming, app.format)
}
