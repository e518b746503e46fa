// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domains and their crawl configurations

use crate::error::HarvestError;
use crate::harvest::{ConfigRef, HarvestId};
use crate::history::HarvestInfo;
use serde::{Deserialize, Serialize};

/// One way of crawling a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfiguration {
    pub domain: String,
    pub name: String,
    /// Opaque crawl template identifier; jobs never mix templates
    pub template: String,
    /// Expected number of objects, from harvest history
    #[serde(default)]
    pub expected_size: u64,
    /// Byte ceiling, `None` for unlimited
    #[serde(default)]
    pub max_bytes: Option<u64>,
    /// Object ceiling, `None` for unlimited
    #[serde(default)]
    pub max_objects: Option<u64>,
}

impl DomainConfiguration {
    pub fn new(
        domain: impl Into<String>,
        name: impl Into<String>,
        template: impl Into<String>,
        expected_size: u64,
    ) -> Self {
        Self {
            domain: domain.into(),
            name: name.into(),
            template: template.into(),
            expected_size,
            max_bytes: None,
            max_objects: None,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn with_max_objects(mut self, max_objects: u64) -> Self {
        self.max_objects = Some(max_objects);
        self
    }

    pub fn config_ref(&self) -> ConfigRef {
        ConfigRef::new(&self.domain, &self.name)
    }
}

/// A crawlable site with its configurations and harvest history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    /// The domain this one is an alias of, if any
    #[serde(default)]
    pub alias_of: Option<String>,
    pub default_config: String,
    pub configurations: Vec<DomainConfiguration>,
    #[serde(default)]
    pub history: Vec<HarvestInfo>,
    #[serde(default)]
    pub edition: u64,
}

impl Domain {
    /// Create a domain whose default is the given configuration
    pub fn new(default: DomainConfiguration) -> Self {
        Self {
            name: default.domain.clone(),
            alias_of: None,
            default_config: default.name.clone(),
            configurations: vec![default],
            history: Vec::new(),
            edition: 0,
        }
    }

    /// Check invariants that deserialization cannot enforce
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.name.trim().is_empty() {
            return Err(HarvestError::invalid("domain name must not be empty"));
        }
        if self.alias_of.as_deref() == Some(self.name.as_str()) {
            return Err(HarvestError::IllegalState(format!(
                "domain {} cannot be an alias of itself",
                self.name
            )));
        }
        for (i, config) in self.configurations.iter().enumerate() {
            if config.domain != self.name {
                return Err(HarvestError::invalid(format!(
                    "configuration {} belongs to {}, not {}",
                    config.name, config.domain, self.name
                )));
            }
            if self.configurations[..i].iter().any(|c| c.name == config.name) {
                return Err(HarvestError::invalid(format!(
                    "duplicate configuration {} on {}",
                    config.name, self.name
                )));
            }
        }
        self.default_configuration().map(|_| ())
    }

    pub fn configuration(&self, name: &str) -> Result<&DomainConfiguration, HarvestError> {
        self.configurations
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| HarvestError::unknown("configuration", format!("{}/{}", self.name, name)))
    }

    pub fn default_configuration(&self) -> Result<&DomainConfiguration, HarvestError> {
        self.configuration(&self.default_config)
    }

    pub fn add_configuration(&mut self, config: DomainConfiguration) -> Result<(), HarvestError> {
        if config.domain != self.name {
            return Err(HarvestError::invalid(format!(
                "configuration {} belongs to {}, not {}",
                config.name, config.domain, self.name
            )));
        }
        if self.configurations.iter().any(|c| c.name == config.name) {
            return Err(HarvestError::invalid(format!(
                "duplicate configuration {} on {}",
                config.name, self.name
            )));
        }
        self.configurations.push(config);
        Ok(())
    }

    /// Remove a configuration; the default one cannot be removed
    pub fn remove_configuration(&mut self, name: &str) -> Result<DomainConfiguration, HarvestError> {
        if name == self.default_config {
            return Err(HarvestError::IllegalState(format!(
                "cannot remove default configuration {} of {}",
                name, self.name
            )));
        }
        let index = self
            .configurations
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| HarvestError::unknown("configuration", format!("{}/{}", self.name, name)))?;
        Ok(self.configurations.remove(index))
    }

    pub fn record_harvest(&mut self, info: HarvestInfo) -> Result<(), HarvestError> {
        if info.domain != self.name {
            return Err(HarvestError::invalid(format!(
                "harvest info for {} recorded on {}",
                info.domain, self.name
            )));
        }
        self.history.push(info);
        Ok(())
    }

    /// Most recent harvest info produced by any of the given harvests
    pub fn latest_harvest_in(&self, lineage: &[HarvestId]) -> Option<&HarvestInfo> {
        self.history
            .iter()
            .filter(|info| lineage.contains(&info.harvest_id))
            .max_by_key(|info| info.date)
    }
}

#[cfg(test)]
#[path = "domain_tests.rs"]
mod tests;
