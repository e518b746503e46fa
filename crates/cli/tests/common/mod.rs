// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};

/// Path of a file under tests/fixtures
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// `hv --fixture news.toml`, logging quietly
pub fn hv() -> Command {
    let mut cmd = Command::cargo_bin("hv").expect("hv binary");
    cmd.env("RUST_LOG", "warn")
        .arg("--fixture")
        .arg(fixture("news.toml"));
    cmd
}

/// Like [`hv`], keeping state in `store`
pub fn hv_in(store: &Path) -> Command {
    let mut cmd = hv();
    cmd.arg("--store").arg(store);
    cmd
}

/// Run a command that prints JSON and parse its stdout
pub fn json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.arg("--format").arg("json").output().expect("run hv");
    assert!(
        output.status.success(),
        "hv failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("valid JSON")
}
