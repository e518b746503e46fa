// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hv plan`: show how harvests would be split into jobs, without firing

use super::App;
use crate::output;
use anyhow::Result;
use clap::Args;
use hv_core::{HarvestDefinition, HarvestId, PlannedJob, SizePartitioner};
use hv_engine::resolve::{lineage, resolve_selective, resolve_snapshot};
use serde::Serialize;
use std::fmt;

#[derive(Args)]
pub struct PlanArgs {
    /// Only plan this harvest
    #[arg(long)]
    pub harvest: Option<String>,
}

#[derive(Serialize)]
struct HarvestPlan {
    harvest_id: String,
    name: String,
    kind: &'static str,
    jobs: Vec<JobPlan>,
}

#[derive(Serialize)]
struct JobPlan {
    template: String,
    members: Vec<String>,
    total_expected_size: u64,
    byte_ceiling: Option<u64>,
}

impl From<PlannedJob> for JobPlan {
    fn from(plan: PlannedJob) -> Self {
        Self {
            template: plan.template,
            members: plan.members.iter().map(ToString::to_string).collect(),
            total_expected_size: plan.total_expected_size,
            byte_ceiling: plan.byte_ceiling,
        }
    }
}

impl fmt::Display for HarvestPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.jobs.len() == 1 { "job" } else { "jobs" };
        write!(
            f,
            "{} {} ({}): {} {}",
            self.harvest_id,
            self.name,
            self.kind,
            self.jobs.len(),
            noun
        )?;
        for (i, job) in self.jobs.iter().enumerate() {
            let ceiling = job
                .byte_ceiling
                .map_or_else(|| "unlimited".to_string(), |b| b.to_string());
            write!(
                f,
                "\n  job {}  {}  expected {}  bytes {}\n    {}",
                i + 1,
                job.template,
                job.total_expected_size,
                ceiling,
                job.members.join(", ")
            )?;
        }
        Ok(())
    }
}

pub fn handle(app: &App, args: PlanArgs) -> Result<()> {
    let harvests = match args.harvest {
        Some(id) => vec![app.store.harvest(&HarvestId::new(id))?],
        None => app.store.harvests(),
    };
    let partitioner = SizePartitioner::new(app.config.partition.clone());
    let plans = harvests
        .iter()
        .map(|harvest| plan(app, &partitioner, harvest))
        .collect::<Result<Vec<_>>>()?;
    output::print_list(&plans, "No harvests", app.format)
}

fn plan(app: &App, partitioner: &SizePartitioner, harvest: &HarvestDefinition) -> Result<HarvestPlan> {
    let domains = app.store.domains();
    let (kind, jobs) = if harvest.is_snapshot() {
        let configs = resolve_snapshot(&domains, &lineage(&app.store, harvest))?;
        ("snapshot", partitioner.partition_snapshot(&configs, &harvest.caps()))
    } else {
        let configs = resolve_selective(harvest, &domains)?;
        ("selective", partitioner.partition(&configs, &harvest.caps()))
    };
    Ok(HarvestPlan {
        harvest_id: harvest.id.to_string(),
        name: harvest.name.clone(),
        kind,
        jobs: jobs.into_iter().map(JobPlan::from).collect(),
    })
}
