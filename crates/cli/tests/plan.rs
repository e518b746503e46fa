// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests for planning and schedule listing

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use assert_cmd::Command;
use common::{fixture, hv, json};
use predicates::prelude::*;

#[test]
fn test_hv_help() {
    Command::cargo_bin("hv")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("size-balanced crawl jobs"));
}

#[test]
fn test_plan_with_default_limits_makes_one_job_per_harvest() {
    hv().args(["plan", "--harvest", "hd-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hd-1 news (selective): 1 job"))
        .stdout(predicate::str::contains("expected 8300"));
}

#[test]
fn test_plan_honors_engine_config() {
    let plans = json(
        hv().arg("--config")
            .arg(fixture("uneven.toml"))
            .args(["plan", "--harvest", "hd-1"]),
    );
    let jobs = plans[0]["jobs"].as_array().unwrap();
    let mut totals: Vec<u64> = jobs
        .iter()
        .map(|j| j["total_expected_size"].as_u64().unwrap())
        .collect();
    totals.sort_unstable();
    assert_eq!(totals, vec![500, 7800]);
}

#[test]
fn test_plan_lists_every_harvest() {
    hv().arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains("hd-1 news (selective)"))
        .stdout(predicate::str::contains("snap full (snapshot): 1 job"));
}

#[test]
fn test_plan_unknown_harvest_fails() {
    hv().args(["plan", "--harvest", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_schedule_lists_upcoming_events() {
    hv().args([
        "schedule",
        "daily",
        "--from",
        "2005-06-12T22:42:00Z",
        "--count",
        "2",
    ])
    .assert()
    .success()
    .stdout(predicate::str::contains("daily: every day at 04:22"))
    .stdout(predicate::str::contains("2005-06-13T04:22:00+00:00"))
    .stdout(predicate::str::contains("2005-06-14T04:22:00+00:00"))
    .stdout(predicate::str::contains("2005-06-15").not());
}

#[test]
fn test_bad_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.toml");
    std::fs::write(&path, "[retry]\nmax_attempts = 0\n").unwrap();
    hv().arg("--config")
        .arg(&path)
        .arg("plan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_attempts"));
}
