// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TOML fixtures describing schedules, domains and harvest definitions
//!
//! Timestamps are RFC 3339 strings, e.g. `created = "2005-06-12T22:42:00Z"`.
//! Members are written `"domain/config"`, or just `"domain"` for the
//! domain's default configuration.

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use hv_core::{
    ConfigRef, Domain, DomainConfiguration, HarvestDefinition, HarvestId, HarvestInfo, Schedule,
    SnapshotLimits, StopReason,
};
use hv_storage::HarvestStore;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    #[serde(default)]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub domains: Vec<DomainFixture>,
    #[serde(default)]
    pub harvests: Vec<HarvestFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainFixture {
    pub name: String,
    #[serde(default)]
    pub alias_of: Option<String>,
    /// Defaults to the first configuration
    #[serde(default)]
    pub default_config: Option<String>,
    pub configurations: Vec<ConfigFixture>,
    #[serde(default)]
    pub history: Vec<HistoryFixture>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFixture {
    pub name: String,
    pub template: String,
    #[serde(default)]
    pub expected_size: u64,
    #[serde(default)]
    pub max_bytes: Option<u64>,
    #[serde(default)]
    pub max_objects: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryFixture {
    pub harvest: String,
    pub config: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub objects: u64,
    #[serde(default)]
    pub bytes: u64,
    pub stop_reason: StopReason,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarvestFixture {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Schedule name; selective harvests only
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub members: Vec<String>,
    /// Present for snapshot harvests
    #[serde(default)]
    pub snapshot: Option<SnapshotLimits>,
    /// When the definition was submitted; defaults to the load time
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// Counts of records a seed added to the store
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Seeded {
    pub schedules: usize,
    pub domains: usize,
    pub harvests: usize,
}

impl Fixture {
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing fixture {}", path.display()))
    }

    /// Insert every record the store does not know yet.
    ///
    /// Records already present (from an earlier run against the same store)
    /// are left as they are, so their firing state survives.
    pub fn seed(&self, store: &HarvestStore, now: DateTime<Utc>) -> Result<Seeded> {
        let mut seeded = Seeded::default();
        for schedule in &self.schedules {
            if store.schedule(&schedule.name).is_err() {
                store.insert_schedule(schedule.clone())?;
                seeded.schedules += 1;
            }
        }
        for fixture in &self.domains {
            if store.domain(&fixture.name).is_err() {
                store.insert_domain(fixture.to_domain()?)?;
                seeded.domains += 1;
            }
        }
        for fixture in &self.harvests {
            let id = HarvestId::new(fixture.id.as_str());
            if store.harvest(&id).is_err() {
                store.insert_harvest(fixture.to_definition(store, now)?)?;
                seeded.harvests += 1;
            }
        }
        tracing::debug!(?seeded, "seeded store from fixture");
        Ok(seeded)
    }
}

impl DomainFixture {
    pub fn to_domain(&self) -> Result<Domain> {
        let Some(first) = self.configurations.first() else {
            bail!("domain {} has no configurations", self.name);
        };
        let mut domain = Domain::new(self.config(first));
        for config in &self.configurations[1..] {
            domain.add_configuration(self.config(config))?;
        }
        if let Some(default) = &self.default_config {
            domain.default_config = default.clone();
        }
        domain.alias_of = self.alias_of.clone();
        for entry in &self.history {
            domain.record_harvest(HarvestInfo {
                harvest_id: HarvestId::new(entry.harvest.as_str()),
                domain: self.name.clone(),
                config: entry.config.clone(),
                date: entry.date,
                count_objects: entry.objects,
                size_bytes: entry.bytes,
                stop_reason: entry.stop_reason,
            })?;
        }
        domain.validate()?;
        Ok(domain)
    }

    fn config(&self, config: &ConfigFixture) -> DomainConfiguration {
        DomainConfiguration {
            domain: self.name.clone(),
            name: config.name.clone(),
            template: config.template.clone(),
            expected_size: config.expected_size,
            max_bytes: config.max_bytes,
            max_objects: config.max_objects,
        }
    }
}

impl HarvestFixture {
    /// Build the definition, resolving schedules and default configurations
    /// against what the store already holds
    pub fn to_definition(&self, store: &HarvestStore, now: DateTime<Utc>) -> Result<HarvestDefinition> {
        let id = HarvestId::new(self.id.as_str());
        let created = self.created.unwrap_or(now);
        let mut definition = match (&self.schedule, &self.snapshot) {
            (Some(schedule), None) => {
                let schedule = store
                    .schedule(schedule)
                    .with_context(|| format!("harvest {}", self.id))?;
                let members = self
                    .members
                    .iter()
                    .map(|m| parse_member(store, m))
                    .collect::<Result<Vec<_>>>()?;
                HarvestDefinition::selective(id, self.name.as_str(), &schedule, members, created)?
            }
            (None, Some(limits)) => {
                if !self.members.is_empty() {
                    bail!("snapshot harvest {} cannot list members", self.id);
                }
                HarvestDefinition::snapshot(id, self.name.as_str(), limits.clone(), created)?
            }
            _ => bail!(
                "harvest {} needs exactly one of `schedule` or `snapshot`",
                self.id
            ),
        };
        definition.comments = self.comments.clone();
        definition.active = self.active;
        Ok(definition)
    }
}

fn parse_member(store: &HarvestStore, member: &str) -> Result<ConfigRef> {
    match member.split_once('/') {
        Some((domain, config)) if !domain.is_empty() && !config.is_empty() => {
            Ok(ConfigRef::new(domain, config))
        }
        Some(_) => Err(anyhow!("malformed member {:?}", member)),
        None => {
            let domain = store.domain(member)?;
            Ok(ConfigRef::new(member, domain.default_config))
        }
    }
}

#[cfg(test)]
#[path = "fixture_tests.rs"]
mod tests;
