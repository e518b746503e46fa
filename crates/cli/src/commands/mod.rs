// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod jobs;
pub mod plan;
pub mod schedule;
pub mod tick;

use crate::output::OutputFormat;
use hv_core::{SystemClock, UuidIdGen};
use hv_engine::{EngineConfig, HarvestRunner, RunnerDeps, TracingNotifier};
use hv_storage::HarvestStore;
use std::sync::Arc;

pub type Runner = HarvestRunner<SystemClock, UuidIdGen, TracingNotifier>;

/// What every command works against
pub struct App {
    pub store: Arc<HarvestStore>,
    pub config: EngineConfig,
    pub format: OutputFormat,
}

impl App {
    pub fn runner(&self) -> Runner {
        HarvestRunner::new(
            RunnerDeps {
                store: Arc::clone(&self.store),
                clock: SystemClock,
                id_gen: UuidIdGen,
                notifier: TracingNotifier,
            },
            self.config.clone(),
        )
    }
}
