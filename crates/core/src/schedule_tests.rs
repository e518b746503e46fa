// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::frequency::TimeUnit;
use chrono::{TimeDelta, TimeZone};

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn daily() -> Schedule {
    Schedule::new("daily", Frequency::daily_at(4, 4, 22).unwrap()).unwrap()
}

#[test]
fn empty_name_is_rejected() {
    let freq = Frequency::anytime(TimeUnit::Daily, 1).unwrap();
    assert!(matches!(
        Schedule::new("  ", freq),
        Err(HarvestError::InvalidArgument(_))
    ));
}

#[test]
fn first_event_uses_now_when_no_start() {
    let first = daily().first_event(ts(2005, 6, 12, 22, 42)).unwrap();
    assert_eq!(first, Some(ts(2005, 6, 13, 4, 22)));
}

#[test]
fn first_event_waits_for_future_start() {
    let schedule = daily().starting(ts(2005, 7, 1, 0, 0));
    let first = schedule.first_event(ts(2005, 6, 12, 22, 42)).unwrap();
    assert_eq!(first, Some(ts(2005, 7, 1, 4, 22)));
}

#[test]
fn first_event_ignores_past_start() {
    let schedule = daily().starting(ts(2004, 1, 1, 0, 0));
    let first = schedule.first_event(ts(2005, 6, 12, 22, 42)).unwrap();
    assert_eq!(first, Some(ts(2005, 6, 13, 4, 22)));
}

#[test]
fn first_event_after_end_is_none() {
    let schedule = daily().ending(ts(2005, 6, 13, 0, 0));
    assert_eq!(schedule.first_event(ts(2005, 6, 12, 22, 42)).unwrap(), None);
}

#[test]
fn start_after_end_is_none() {
    let schedule = daily()
        .starting(ts(2006, 1, 1, 0, 0))
        .ending(ts(2005, 12, 31, 0, 0));
    assert_eq!(schedule.first_event(ts(2005, 6, 12, 0, 0)).unwrap(), None);
}

#[test]
fn zero_repeats_never_fires() {
    let schedule = daily().repeating(0);
    assert_eq!(schedule.first_event(ts(2005, 6, 12, 0, 0)).unwrap(), None);
}

#[test]
fn max_repeats_one_allows_exactly_one_event() {
    let schedule = daily().repeating(1);
    let first = ts(2005, 6, 13, 4, 22);
    assert!(schedule.next_event(first, 0).unwrap().is_some());
    assert_eq!(schedule.next_event(first, 1).unwrap(), None);
}

#[test]
fn next_event_stops_at_end() {
    let schedule = daily().ending(ts(2005, 6, 20, 0, 0));
    let first = ts(2005, 6, 13, 4, 22);
    assert_eq!(
        schedule.next_event(first, 1).unwrap(),
        Some(ts(2005, 6, 17, 4, 22))
    );
    assert_eq!(schedule.next_event(ts(2005, 6, 17, 4, 22), 2).unwrap(), None);
}

#[test]
fn earlier_termination_wins() {
    let schedule = daily().ending(ts(2010, 1, 1, 0, 0)).repeating(2);
    let first = ts(2005, 6, 13, 4, 22);
    assert!(schedule.next_event(first, 1).unwrap().is_some());
    assert_eq!(schedule.next_event(first, 2).unwrap(), None);
}

#[test]
fn upcoming_lists_bounded_events() {
    let schedule = daily().repeating(3);
    let events = schedule.upcoming(ts(2005, 6, 12, 22, 42), 10).unwrap();
    assert_eq!(
        events,
        vec![
            ts(2005, 6, 13, 4, 22),
            ts(2005, 6, 17, 4, 22),
            ts(2005, 6, 21, 4, 22),
        ]
    );
}

#[test]
fn upcoming_respects_count() {
    let schedule = Schedule::new("hourly", Frequency::anytime(TimeUnit::Hourly, 1).unwrap())
        .unwrap();
    let now = ts(2005, 6, 12, 0, 0);
    let events = schedule.upcoming(now, 2).unwrap();
    assert_eq!(events, vec![now, now + TimeDelta::hours(1)]);
}

#[test]
fn deserializes_with_defaults() {
    let schedule: Schedule = serde_json::from_str(
        r#"{"name":"weekly","frequency":{"unit":"weekly","every":1,"day_of_week":1,"hour":3,"minute":0}}"#,
    )
    .unwrap();
    assert_eq!(schedule.name, "weekly");
    assert_eq!(schedule.max_repeats, None);
    assert_eq!(schedule.edition, 0);
}
