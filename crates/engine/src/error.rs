// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the harvest runner

use hv_core::HarvestError;
use hv_storage::StoreError;
use thiserror::Error;

/// Errors that can occur while firing harvests or driving jobs
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Harvest(#[from] HarvestError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{target}: gave up after {attempts} stale writes")]
    RetriesExhausted { target: String, attempts: u32 },
    #[error("config error: {0}")]
    Config(String),
    #[error("firing task failed: {0}")]
    Task(String),
}

impl RunError {
    /// Whether the error came from a concurrent edit of the same record
    pub fn is_stale(&self) -> bool {
        match self {
            RunError::Store(e) => e.is_stale(),
            RunError::RetriesExhausted { .. } => true,
            _ => false,
        }
    }
}
