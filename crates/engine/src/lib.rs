// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Harvest engine: fires definitions into jobs against a harvest store

mod config;
mod error;
mod guard;
pub mod notify;
pub mod resolve;
mod runner;

pub use config::{EngineConfig, RetryConfig};
pub use error::RunError;
pub use guard::{FiringGuard, FiringGuards};
pub use notify::{NoOpNotifier, Notifier, NotifyError, TracingNotifier};
pub use runner::{HarvestRunner, RunnerDeps, TickOutcome};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotifier;
