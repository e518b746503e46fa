// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration loaded from TOML

use crate::error::RunError;
use hv_core::PartitionLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Partitioning thresholds and retry policy for a runner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub partition: PartitionLimits,
    pub retry: RetryConfig,
}

/// How often a firing is re-attempted after a stale write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub max_attempts: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl EngineConfig {
    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml(content: &str) -> Result<Self, RunError> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| RunError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, RunError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RunError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), ?config, "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RunError> {
        if self.retry.max_attempts == 0 {
            return Err(RunError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.partition.max_relative_size_difference == 0 {
            return Err(RunError::Config(
                "partition.max_relative_size_difference must be at least 1".to_string(),
            ));
        }
        if self.partition.snapshot_config_count == Some(0) {
            return Err(RunError::Config(
                "partition.snapshot_config_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
