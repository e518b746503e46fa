// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurrence policies for harvest schedules
//!
//! A [`Frequency`] repeats every N hours, days, weeks or months. It either
//! fires "anytime" (as soon as possible, then exactly N units later) or on a
//! fixed slot: a minute of the hour, a time of day, a weekday or a day of the
//! month. Fixed slots are re-applied after every step, so calendar
//! irregularities such as short months never make the schedule drift.

use crate::error::HarvestError;
use chrono::{DateTime, Datelike, Months, NaiveDate, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The unit a frequency repeats in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl TimeUnit {
    fn noun(&self) -> &'static str {
        match self {
            TimeUnit::Hourly => "hour",
            TimeUnit::Daily => "day",
            TimeUnit::Weekly => "week",
            TimeUnit::Monthly => "month",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Hourly => write!(f, "hourly"),
            TimeUnit::Daily => write!(f, "daily"),
            TimeUnit::Weekly => write!(f, "weekly"),
            TimeUnit::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hourly" => Ok(TimeUnit::Hourly),
            "daily" => Ok(TimeUnit::Daily),
            "weekly" => Ok(TimeUnit::Weekly),
            "monthly" => Ok(TimeUnit::Monthly),
            _ => Err(format!("unknown time unit: {}", s)),
        }
    }
}

/// The slot inside each period at which a frequency fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// No constraint, fire as soon as possible
    Anytime,
    /// Minute of the hour (hourly)
    Minute { minute: u32 },
    /// Time of day (daily)
    TimeOfDay { hour: u32, minute: u32 },
    /// Day of week, 1 = Monday .. 7 = Sunday (weekly)
    DayOfWeek { day: u32, hour: u32, minute: u32 },
    /// Day of month 1..=31, clamped to the month's last day (monthly)
    DayOfMonth { day: u32, hour: u32, minute: u32 },
}

/// An immutable recurrence policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FrequencySpec", into = "FrequencySpec")]
pub struct Frequency {
    unit: TimeUnit,
    every: u32,
    slot: Slot,
}

impl Frequency {
    /// Build a frequency from its raw fields.
    ///
    /// Leaving every time field unset yields an "anytime" frequency. Otherwise
    /// `minute` is always required, `hour` unless the unit is hourly, and the
    /// day field matching a weekly or monthly unit.
    pub fn new(
        unit: TimeUnit,
        every: u32,
        minute: Option<u32>,
        hour: Option<u32>,
        day_of_week: Option<u32>,
        day_of_month: Option<u32>,
    ) -> Result<Self, HarvestError> {
        if every == 0 {
            return Err(HarvestError::invalid(
                "repeat interval must be at least one unit",
            ));
        }

        if minute.is_none() && hour.is_none() && day_of_week.is_none() && day_of_month.is_none() {
            return Ok(Self {
                unit,
                every,
                slot: Slot::Anytime,
            });
        }

        let minute = minute
            .ok_or_else(|| HarvestError::invalid("minute is required for a fixed-time frequency"))?;
        check_range("minute", minute, 0, 59)?;
        if let Some(hour) = hour {
            check_range("hour", hour, 0, 23)?;
        }

        let slot = match unit {
            TimeUnit::Hourly => {
                reject_field(unit, "hour", hour)?;
                reject_field(unit, "day_of_week", day_of_week)?;
                reject_field(unit, "day_of_month", day_of_month)?;
                Slot::Minute { minute }
            }
            TimeUnit::Daily => {
                reject_field(unit, "day_of_week", day_of_week)?;
                reject_field(unit, "day_of_month", day_of_month)?;
                Slot::TimeOfDay {
                    hour: require_field(unit, "hour", hour)?,
                    minute,
                }
            }
            TimeUnit::Weekly => {
                reject_field(unit, "day_of_month", day_of_month)?;
                let day = require_field(unit, "day_of_week", day_of_week)?;
                check_range("day_of_week", day, 1, 7)?;
                Slot::DayOfWeek {
                    day,
                    hour: require_field(unit, "hour", hour)?,
                    minute,
                }
            }
            TimeUnit::Monthly => {
                reject_field(unit, "day_of_week", day_of_week)?;
                let day = require_field(unit, "day_of_month", day_of_month)?;
                check_range("day_of_month", day, 1, 31)?;
                Slot::DayOfMonth {
                    day,
                    hour: require_field(unit, "hour", hour)?,
                    minute,
                }
            }
        };

        Ok(Self { unit, every, slot })
    }

    /// Fire as soon as possible, then every `every` units
    pub fn anytime(unit: TimeUnit, every: u32) -> Result<Self, HarvestError> {
        Self::new(unit, every, None, None, None, None)
    }

    pub fn hourly_at(every: u32, minute: u32) -> Result<Self, HarvestError> {
        Self::new(TimeUnit::Hourly, every, Some(minute), None, None, None)
    }

    pub fn daily_at(every: u32, hour: u32, minute: u32) -> Result<Self, HarvestError> {
        Self::new(TimeUnit::Daily, every, Some(minute), Some(hour), None, None)
    }

    pub fn weekly_at(
        every: u32,
        day_of_week: u32,
        hour: u32,
        minute: u32,
    ) -> Result<Self, HarvestError> {
        Self::new(
            TimeUnit::Weekly,
            every,
            Some(minute),
            Some(hour),
            Some(day_of_week),
            None,
        )
    }

    pub fn monthly_at(
        every: u32,
        day_of_month: u32,
        hour: u32,
        minute: u32,
    ) -> Result<Self, HarvestError> {
        Self::new(
            TimeUnit::Monthly,
            every,
            Some(minute),
            Some(hour),
            None,
            Some(day_of_month),
        )
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    pub fn every(&self) -> u32 {
        self.every
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    pub fn is_anytime(&self) -> bool {
        matches!(self.slot, Slot::Anytime)
    }

    /// The earliest firing at or after `reference`.
    ///
    /// Anytime frequencies fire at `reference` itself. Fixed frequencies move
    /// forward to the next matching slot; a reference that already sits
    /// exactly on a slot is returned unchanged.
    pub fn first_event(&self, reference: DateTime<Utc>) -> Result<DateTime<Utc>, HarvestError> {
        let naive = reference.naive_utc();
        let date = naive.date();

        let candidate = match self.slot {
            Slot::Anytime => return Ok(reference),
            Slot::Minute { minute } => at(date, naive.hour(), minute)?,
            Slot::TimeOfDay { hour, minute } => at(date, hour, minute)?,
            Slot::DayOfWeek { day, hour, minute } => {
                let today = date.weekday().number_from_monday();
                let offset = (day + 7 - today) % 7;
                at(shift(date, TimeDelta::days(i64::from(offset)))?, hour, minute)?
            }
            Slot::DayOfMonth { day, hour, minute } => {
                at(clamped_day(date.year(), date.month(), day)?, hour, minute)?
            }
        };

        if candidate >= reference {
            return Ok(candidate);
        }

        match self.slot {
            Slot::Anytime => Ok(reference),
            Slot::Minute { .. } => add(candidate, TimeDelta::hours(1)),
            Slot::TimeOfDay { .. } => add(candidate, TimeDelta::days(1)),
            Slot::DayOfWeek { .. } => add(candidate, TimeDelta::weeks(1)),
            Slot::DayOfMonth { day, hour, minute } => {
                let (year, month) = following_month(date.year(), date.month());
                at(clamped_day(year, month, day)?, hour, minute)
            }
        }
    }

    /// The firing exactly one period (`every` units) after `previous`.
    ///
    /// Fixed slots are re-applied after the step, so a monthly slot on the
    /// 31st lands on 28 February and returns to 31 March.
    pub fn next_event(&self, previous: DateTime<Utc>) -> Result<DateTime<Utc>, HarvestError> {
        let every = i64::from(self.every);
        let stepped = match self.unit {
            TimeUnit::Hourly => add(previous, TimeDelta::hours(every))?,
            TimeUnit::Daily => add(previous, TimeDelta::days(every))?,
            TimeUnit::Weekly => add(previous, TimeDelta::weeks(every))?,
            TimeUnit::Monthly => previous
                .checked_add_months(Months::new(self.every))
                .ok_or_else(out_of_range)?,
        };
        self.first_event(stepped)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.every == 1 {
            write!(f, "every {}", self.unit.noun())?;
        } else {
            write!(f, "every {} {}s", self.every, self.unit.noun())?;
        }
        match self.slot {
            Slot::Anytime => write!(f, ", anytime"),
            Slot::Minute { minute } => write!(f, " at minute {:02}", minute),
            Slot::TimeOfDay { hour, minute } => write!(f, " at {:02}:{:02}", hour, minute),
            Slot::DayOfWeek { day, hour, minute } => {
                write!(f, " on weekday {} at {:02}:{:02}", day, hour, minute)
            }
            Slot::DayOfMonth { day, hour, minute } => {
                write!(f, " on day {} at {:02}:{:02}", day, hour, minute)
            }
        }
    }
}

/// Flat, serializable form of a [`Frequency`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencySpec {
    pub unit: TimeUnit,
    pub every: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minute: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
}

impl TryFrom<FrequencySpec> for Frequency {
    type Error = HarvestError;

    fn try_from(spec: FrequencySpec) -> Result<Self, Self::Error> {
        Frequency::new(
            spec.unit,
            spec.every,
            spec.minute,
            spec.hour,
            spec.day_of_week,
            spec.day_of_month,
        )
    }
}

impl From<Frequency> for FrequencySpec {
    fn from(freq: Frequency) -> Self {
        let mut spec = FrequencySpec {
            unit: freq.unit,
            every: freq.every,
            minute: None,
            hour: None,
            day_of_week: None,
            day_of_month: None,
        };
        match freq.slot {
            Slot::Anytime => {}
            Slot::Minute { minute } => spec.minute = Some(minute),
            Slot::TimeOfDay { hour, minute } => {
                spec.hour = Some(hour);
                spec.minute = Some(minute);
            }
            Slot::DayOfWeek { day, hour, minute } => {
                spec.day_of_week = Some(day);
                spec.hour = Some(hour);
                spec.minute = Some(minute);
            }
            Slot::DayOfMonth { day, hour, minute } => {
                spec.day_of_month = Some(day);
                spec.hour = Some(hour);
                spec.minute = Some(minute);
            }
        }
        spec
    }
}

fn check_range(field: &str, value: u32, min: u32, max: u32) -> Result<(), HarvestError> {
    if value < min || value > max {
        return Err(HarvestError::invalid(format!(
            "{} must be in {}..={}, got {}",
            field, min, max, value
        )));
    }
    Ok(())
}

fn require_field(unit: TimeUnit, field: &str, value: Option<u32>) -> Result<u32, HarvestError> {
    value.ok_or_else(|| {
        HarvestError::invalid(format!("{} is required for a fixed {} frequency", field, unit))
    })
}

fn reject_field(unit: TimeUnit, field: &str, value: Option<u32>) -> Result<(), HarvestError> {
    match value {
        Some(_) => Err(HarvestError::invalid(format!(
            "{} does not apply to a {} frequency",
            field, unit
        ))),
        None => Ok(()),
    }
}

fn out_of_range() -> HarvestError {
    HarvestError::invalid("timestamp out of calendar range")
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> Result<DateTime<Utc>, HarvestError> {
    date.and_hms_opt(hour, minute, 0)
        .map(|naive| naive.and_utc())
        .ok_or_else(out_of_range)
}

fn add(t: DateTime<Utc>, delta: TimeDelta) -> Result<DateTime<Utc>, HarvestError> {
    t.checked_add_signed(delta).ok_or_else(out_of_range)
}

fn shift(date: NaiveDate, delta: TimeDelta) -> Result<NaiveDate, HarvestError> {
    date.checked_add_signed(delta).ok_or_else(out_of_range)
}

fn following_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

/// The given day of the month, or the month's last day if it is shorter
fn clamped_day(year: i32, month: u32, day: u32) -> Result<NaiveDate, HarvestError> {
    let (next_year, next_month) = following_month(year, month);
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .ok_or_else(out_of_range)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last.day())).ok_or_else(out_of_range)
}

#[cfg(test)]
#[path = "frequency_tests.rs"]
mod tests;
