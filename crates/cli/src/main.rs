// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hv - harvest scheduling CLI

mod commands;
mod fixture;
mod output;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use commands::{jobs, plan, schedule, tick, App};
use fixture::Fixture;
use hv_engine::EngineConfig;
use hv_storage::HarvestStore;
use output::OutputFormat;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "hv",
    version,
    about = "hv - fires scheduled web harvests into size-balanced crawl jobs"
)]
struct Cli {
    /// Keep state in this directory (replayed from its log on start);
    /// without it everything lives in memory for one invocation
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// TOML fixture of schedules, domains and harvests to load
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Engine configuration (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how harvests would be split into jobs
    Plan(plan::PlanArgs),
    /// Fire every due selective harvest
    Tick(tick::TickArgs),
    /// Run a snapshot harvest once
    Snapshot(tick::SnapshotArgs),
    /// Restart a selective harvest's schedule
    Reset(tick::ResetArgs),
    /// List the upcoming events of a schedule
    Schedule(schedule::ScheduleArgs),
    /// Job management
    Jobs {
        #[command(subcommand)]
        command: jobs::JobsCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let store = match &cli.store {
        Some(dir) => HarvestStore::open(dir)?,
        None => HarvestStore::in_memory(),
    };
    if let Some(path) = &cli.fixture {
        Fixture::load(path)?.seed(&store, Utc::now())?;
    }

    let app = App {
        store: Arc::new(store),
        config,
        format: cli.format,
    };

    match cli.command {
        Commands::Plan(args) => plan::handle(&app, args),
        Commands::Tick(args) => tick::tick(&app, args).await,
        Commands::Snapshot(args) => tick::snapshot(&app, args).await,
        Commands::Reset(args) => tick::reset(&app, args).await,
        Commands::Schedule(args) => schedule::handle(&app, args),
        Commands::Jobs { command } => jobs::handle(&app, command).await,
    }
}

/// Log to stderr; `RUST_LOG` overrides the default level
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
