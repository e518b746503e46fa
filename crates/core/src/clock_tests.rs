// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn system_clock_does_not_go_backwards() {
    let clock = SystemClock;
    let t1 = clock.now();
    std::thread::sleep(std::time::Duration::from_millis(1));
    let t2 = clock.now();
    assert!(t2 >= t1);
}

#[test]
fn fake_clock_can_be_advanced() {
    let start = Utc.with_ymd_and_hms(2005, 6, 12, 22, 42, 0).unwrap();
    let clock = FakeClock::at(start);
    clock.advance(TimeDelta::minutes(60));
    assert_eq!(clock.now(), start + TimeDelta::hours(1));
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.now();
    clock2.advance(TimeDelta::seconds(30));
    assert_eq!(clock1.now() - t1, TimeDelta::seconds(30));
}

#[test]
fn fake_clock_can_be_set() {
    let clock = FakeClock::new();
    let target = Utc.with_ymd_and_hms(1940, 4, 9, 9, 30, 0).unwrap();
    clock.set(target);
    assert_eq!(clock.now(), target);
}
