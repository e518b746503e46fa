// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedules: a frequency bounded by a start, an end and a repeat count

use crate::error::HarvestError;
use crate::frequency::Frequency;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named recurrence with optional termination.
///
/// When both `end` and `max_repeats` are set, whichever is reached first
/// stops the schedule. Schedules are replaced wholesale on edit, so the
/// builder methods consume and return `self`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub name: String,
    #[serde(default)]
    pub comments: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_repeats: Option<u32>,
    #[serde(default)]
    pub edition: u64,
}

impl Schedule {
    pub fn new(name: impl Into<String>, frequency: Frequency) -> Result<Self, HarvestError> {
        let schedule = Self {
            name: name.into(),
            comments: String::new(),
            frequency,
            start: None,
            end: None,
            max_repeats: None,
            edition: 0,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn starting(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn ending(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    pub fn repeating(mut self, max_repeats: u32) -> Self {
        self.max_repeats = Some(max_repeats);
        self
    }

    pub fn with_comments(mut self, comments: impl Into<String>) -> Self {
        self.comments = comments.into();
        self
    }

    /// Check invariants that deserialization cannot enforce
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.name.trim().is_empty() {
            return Err(HarvestError::invalid("schedule name must not be empty"));
        }
        Ok(())
    }

    /// First firing at or after the later of `now` and `start`
    pub fn first_event(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>, HarvestError> {
        if self.max_repeats == Some(0) {
            return Ok(None);
        }
        let reference = match self.start {
            Some(start) if start > now => start,
            _ => now,
        };
        if self.is_past_end(reference) {
            return Ok(None);
        }
        let first = self.frequency.first_event(reference)?;
        Ok(self.bounded(first))
    }

    /// Firing after `previous`, given that `fired` events already happened
    pub fn next_event(
        &self,
        previous: DateTime<Utc>,
        fired: u32,
    ) -> Result<Option<DateTime<Utc>>, HarvestError> {
        if let Some(max) = self.max_repeats {
            if fired >= max {
                return Ok(None);
            }
        }
        let next = self.frequency.next_event(previous)?;
        Ok(self.bounded(next))
    }

    /// Up to `count` firings starting from `now`, as a tick loop would see them
    pub fn upcoming(
        &self,
        now: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<DateTime<Utc>>, HarvestError> {
        let mut events = Vec::with_capacity(count);
        let mut next = self.first_event(now)?;
        while let Some(at) = next {
            if events.len() >= count {
                break;
            }
            events.push(at);
            let fired = u32::try_from(events.len()).unwrap_or(u32::MAX);
            next = self.next_event(at, fired)?;
        }
        Ok(events)
    }

    fn is_past_end(&self, at: DateTime<Utc>) -> bool {
        self.end.is_some_and(|end| at > end)
    }

    fn bounded(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.is_past_end(at) {
            None
        } else {
            Some(at)
        }
    }
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
