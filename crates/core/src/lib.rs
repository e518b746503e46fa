// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hv-core: the pure model behind harvest scheduling
//!
//! This crate provides:
//! - Recurrence policies (`Frequency`, `Schedule`)
//! - Harvest definitions, domains and their harvest history
//! - The size-based job partitioner
//! - The job state machine and the events it emits
//!
//! Nothing here performs I/O; every operation works on value snapshots.

pub mod clock;
pub mod error;
pub mod id;

pub mod frequency;
pub mod schedule;

pub mod domain;
pub mod harvest;
pub mod history;

pub mod event;
pub mod job;
pub mod partition;

pub use clock::{Clock, FakeClock, SystemClock};
pub use domain::{Domain, DomainConfiguration};
pub use error::HarvestError;
pub use event::Event;
pub use frequency::{Frequency, FrequencySpec, Slot, TimeUnit};
pub use harvest::{Advance, ConfigRef, HarvestDefinition, HarvestId, HarvestKind, SnapshotLimits};
pub use history::{finished_in_lineage, HarvestInfo, StopReason};
pub use id::{IdGen, SequentialIdGen, UuidIdGen};
pub use job::{Job, JobId, JobStatus};
pub use partition::{
    compare_configs_desc, effective_byte_ceiling, expected_size, DomainCaps, PartitionLimits,
    PlannedJob, SizePartitioner,
};
pub use schedule::Schedule;
