// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Harvest definitions: selective (scheduled) and snapshot (one-shot)

use crate::error::HarvestError;
use crate::partition::DomainCaps;
use crate::schedule::Schedule;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Unique identifier for a harvest definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HarvestId(pub String);

impl HarvestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HarvestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HarvestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HarvestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A (domain, configuration name) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConfigRef {
    pub domain: String,
    pub config: String,
}

impl ConfigRef {
    pub fn new(domain: impl Into<String>, config: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            config: config.into(),
        }
    }
}

impl fmt::Display for ConfigRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.config)
    }
}

/// Caps and lineage of a snapshot harvest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotLimits {
    #[serde(default)]
    pub max_objects: Option<u64>,
    #[serde(default)]
    pub max_bytes: Option<u64>,
    /// Seconds
    #[serde(default)]
    pub max_job_running_time: Option<u64>,
    /// The snapshot this one continues, making it incremental
    #[serde(default)]
    pub previous: Option<HarvestId>,
}

impl SnapshotLimits {
    pub fn caps(&self) -> DomainCaps {
        DomainCaps {
            max_objects: self.max_objects,
            max_bytes: self.max_bytes,
            max_running_time: self.max_job_running_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HarvestKind {
    Selective {
        schedule: String,
        members: Vec<ConfigRef>,
    },
    Snapshot(SnapshotLimits),
}

/// A long-lived harvest policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestDefinition {
    pub id: HarvestId,
    pub name: String,
    #[serde(default)]
    pub comments: String,
    pub active: bool,
    /// Number of firings so far
    #[serde(default)]
    pub num_events: u32,
    #[serde(default)]
    pub next_fire_time: Option<DateTime<Utc>>,
    pub submitted: DateTime<Utc>,
    #[serde(default)]
    pub edition: u64,
    pub kind: HarvestKind,
}

/// Result of advancing a definition past one firing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    pub definition: HarvestDefinition,
    /// Scheduled events that were already in the past and got skipped
    pub skipped: u32,
}

impl HarvestDefinition {
    /// A scheduled harvest; its first firing is the schedule's first event
    pub fn selective(
        id: HarvestId,
        name: impl Into<String>,
        schedule: &Schedule,
        members: Vec<ConfigRef>,
        now: DateTime<Utc>,
    ) -> Result<Self, HarvestError> {
        let definition = Self {
            id,
            name: name.into(),
            comments: String::new(),
            active: true,
            num_events: 0,
            next_fire_time: schedule.first_event(now)?,
            submitted: now,
            edition: 0,
            kind: HarvestKind::Selective {
                schedule: schedule.name.clone(),
                members,
            },
        };
        definition.validate()?;
        Ok(definition)
    }

    /// A one-shot harvest of every known domain
    pub fn snapshot(
        id: HarvestId,
        name: impl Into<String>,
        limits: SnapshotLimits,
        now: DateTime<Utc>,
    ) -> Result<Self, HarvestError> {
        let definition = Self {
            id,
            name: name.into(),
            comments: String::new(),
            active: true,
            num_events: 0,
            next_fire_time: None,
            submitted: now,
            edition: 0,
            kind: HarvestKind::Snapshot(limits),
        };
        definition.validate()?;
        Ok(definition)
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    /// Check invariants that deserialization cannot enforce
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.name.trim().is_empty() {
            return Err(HarvestError::invalid("harvest name must not be empty"));
        }
        match &self.kind {
            HarvestKind::Selective { schedule, members } => {
                if schedule.trim().is_empty() {
                    return Err(HarvestError::invalid(format!(
                        "harvest {} has no schedule",
                        self.name
                    )));
                }
                let mut seen = HashSet::new();
                for member in members {
                    if !seen.insert(member.domain.as_str()) {
                        return Err(HarvestError::invalid(format!(
                            "domain {} appears twice in harvest {}",
                            member.domain, self.name
                        )));
                    }
                }
            }
            HarvestKind::Snapshot(limits) => {
                if limits.previous.as_ref() == Some(&self.id) {
                    return Err(HarvestError::invalid(format!(
                        "snapshot {} cannot continue itself",
                        self.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn is_snapshot(&self) -> bool {
        matches!(self.kind, HarvestKind::Snapshot(_))
    }

    pub fn schedule_name(&self) -> Option<&str> {
        match &self.kind {
            HarvestKind::Selective { schedule, .. } => Some(schedule),
            HarvestKind::Snapshot(_) => None,
        }
    }

    /// Configured members; empty for snapshots
    pub fn members(&self) -> &[ConfigRef] {
        match &self.kind {
            HarvestKind::Selective { members, .. } => members,
            HarvestKind::Snapshot(_) => &[],
        }
    }

    pub fn uses_configuration(&self, domain: &str, config: &str) -> bool {
        self.members()
            .iter()
            .any(|m| m.domain == domain && m.config == config)
    }

    /// Per-domain caps copied into every job; selective harvests are uncapped
    pub fn caps(&self) -> DomainCaps {
        match &self.kind {
            HarvestKind::Selective { .. } => DomainCaps::unlimited(),
            HarvestKind::Snapshot(limits) => limits.caps(),
        }
    }

    pub fn previous_snapshot(&self) -> Option<&HarvestId> {
        match &self.kind {
            HarvestKind::Snapshot(limits) => limits.previous.as_ref(),
            HarvestKind::Selective { .. } => None,
        }
    }

    /// Active and scheduled at or before `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.active && self.next_fire_time.is_some_and(|at| at <= now)
    }

    /// Count one firing and move `next_fire_time` forward.
    ///
    /// Events that fall before `now` are skipped (a trigger that was down
    /// does not replay them), bounded by the schedule's own termination.
    pub fn advance(&self, schedule: &Schedule, now: DateTime<Utc>) -> Result<Advance, HarvestError> {
        let previous = self.next_fire_time.ok_or_else(|| {
            HarvestError::IllegalState(format!("harvest {} has no pending event", self.id))
        })?;

        let num_events = self.num_events.saturating_add(1);
        let mut next = schedule.next_event(previous, num_events)?;
        let mut skipped = 0u32;
        while let Some(at) = next {
            if at >= now {
                break;
            }
            skipped = skipped.saturating_add(1);
            next = schedule.next_event(at, num_events)?;
        }

        let mut definition = self.clone();
        definition.num_events = num_events;
        definition.next_fire_time = next;
        Ok(Advance {
            definition,
            skipped,
        })
    }

    /// Count the single firing of a snapshot and deactivate it
    pub fn complete_snapshot(&self) -> Result<Self, HarvestError> {
        if !self.is_snapshot() {
            return Err(HarvestError::IllegalState(format!(
                "harvest {} is not a snapshot",
                self.id
            )));
        }
        let mut definition = self.clone();
        definition.num_events = self.num_events.saturating_add(1);
        definition.active = false;
        definition.next_fire_time = None;
        Ok(definition)
    }

    /// Restart the schedule as if the definition were new
    pub fn reset(&self, schedule: &Schedule, now: DateTime<Utc>) -> Result<Self, HarvestError> {
        if self.schedule_name() != Some(schedule.name.as_str()) {
            return Err(HarvestError::invalid(format!(
                "schedule {} does not belong to harvest {}",
                schedule.name, self.id
            )));
        }
        let mut definition = self.clone();
        definition.num_events = 0;
        definition.next_fire_time = schedule.first_event(now)?;
        Ok(definition)
    }
}

#[cfg(test)]
#[path = "harvest_tests.rs"]
mod tests;
