// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn second_acquire_fails_until_release() {
    let guards = FiringGuards::new();
    let id = HarvestId::new("hd-1");

    let guard = guards.try_acquire(&id).unwrap();
    assert_eq!(guard.id(), &id);
    assert!(guards.try_acquire(&id).is_none());
    assert!(guards.is_held(&id));

    drop(guard);
    assert!(!guards.is_held(&id));
    assert!(guards.try_acquire(&id).is_some());
}

#[test]
fn different_definitions_do_not_block_each_other() {
    let guards = FiringGuards::new();
    let _a = guards.try_acquire(&HarvestId::new("a")).unwrap();
    assert!(guards.try_acquire(&HarvestId::new("b")).is_some());
}

#[test]
fn clones_share_the_held_set() {
    let guards = FiringGuards::new();
    let other = guards.clone();
    let _a = guards.try_acquire(&HarvestId::new("a")).unwrap();
    assert!(other.try_acquire(&HarvestId::new("a")).is_none());
}
