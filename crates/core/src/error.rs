// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by the pure harvest model

use thiserror::Error;

/// Errors raised by construction and state transitions of harvest records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarvestError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("unknown {kind}: {id}")]
    UnknownIdentity { kind: &'static str, id: String },
    #[error("illegal state: {0}")]
    IllegalState(String),
}

impl HarvestError {
    pub fn invalid(message: impl Into<String>) -> Self {
        HarvestError::InvalidArgument(message.into())
    }

    pub fn unknown(kind: &'static str, id: impl Into<String>) -> Self {
        HarvestError::UnknownIdentity {
            kind,
            id: id.into(),
        }
    }
}
