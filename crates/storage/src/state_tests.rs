// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Utc};
use hv_core::{ConfigRef, DomainCaps, JobId, JobStatus, SnapshotLimits};

fn harvest(id: &str) -> HarvestDefinition {
    let now = Utc.with_ymd_and_hms(2005, 6, 12, 0, 0, 0).unwrap();
    HarvestDefinition::snapshot(HarvestId::new(id), id, SnapshotLimits::default(), now).unwrap()
}

fn job(id: &str, harvest_id: &str) -> Job {
    Job {
        id: JobId::new(id),
        harvest_id: HarvestId::new(harvest_id),
        harvest_num: 1,
        template: "default_orderxml".to_string(),
        members: vec![ConfigRef::new("kb.dk", "default")],
        caps: DomainCaps::unlimited(),
        byte_ceiling: None,
        total_expected_size: 100,
        status: JobStatus::New,
        created_at: Utc.with_ymd_and_hms(2005, 6, 12, 0, 0, 0).unwrap(),
        submitted_at: None,
        started_at: None,
        stopped_at: None,
        resubmitted_as: None,
        edition: 1,
    }
}

#[test]
fn apply_firing_commit() {
    let mut state = MaterializedState::default();
    state.apply(&Operation::FiringCommit {
        harvest: harvest("snap"),
        jobs: vec![job("job-1", "snap"), job("job-2", "snap")],
    });

    assert!(state.harvests.contains(&HarvestId::new("snap")));
    assert_eq!(state.jobs_for(&HarvestId::new("snap")).count(), 2);
}

#[test]
fn apply_delete_keeps_jobs_unless_purged() {
    let mut state = MaterializedState::default();
    state.apply(&Operation::FiringCommit {
        harvest: harvest("a"),
        jobs: vec![job("job-1", "a")],
    });
    state.apply(&Operation::FiringCommit {
        harvest: harvest("b"),
        jobs: vec![job("job-2", "b")],
    });

    state.apply(&Operation::HarvestDelete {
        id: HarvestId::new("a"),
        purge: false,
    });
    assert!(!state.harvests.contains(&HarvestId::new("a")));
    assert_eq!(state.jobs.len(), 2);

    state.apply(&Operation::HarvestDelete {
        id: HarvestId::new("b"),
        purge: true,
    });
    assert_eq!(state.jobs.len(), 1);
    assert!(state.jobs.contains(&JobId::new("job-1")));
}

#[test]
fn apply_put_overwrites_record() {
    let mut state = MaterializedState::default();
    state.apply(&Operation::JobsPut {
        jobs: vec![job("job-1", "a")],
    });
    let mut updated = job("job-1", "a");
    updated.status = JobStatus::Submitted;
    updated.edition = 2;
    state.apply(&Operation::JobsPut {
        jobs: vec![updated],
    });

    let stored = state.jobs.get(&JobId::new("job-1")).unwrap();
    assert_eq!(stored.status, JobStatus::Submitted);
    assert_eq!(stored.edition, 2);
}
