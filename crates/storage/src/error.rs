// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage errors

use crate::wal::WalError;
use hv_core::HarvestError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("stale write to {kind} {id}: expected edition {expected}, found {found}")]
    StaleWrite {
        kind: &'static str,
        id: String,
        expected: u64,
        found: u64,
    },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{kind} already exists: {id}")]
    Duplicate { kind: &'static str, id: String },

    #[error(transparent)]
    Invalid(#[from] HarvestError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether re-reading and retrying could succeed
    pub fn is_stale(&self) -> bool {
        matches!(self, StoreError::StaleWrite { .. })
    }
}

impl From<WalError> for StoreError {
    fn from(e: WalError) -> Self {
        match e {
            WalError::Io(e) => StoreError::Io(e),
            WalError::Json(e) => StoreError::Json(e),
        }
    }
}
