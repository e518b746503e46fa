// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::notify::FakeNotifier;
use chrono::{TimeDelta, TimeZone};
use hv_core::{
    ConfigRef, Domain, DomainConfiguration, FakeClock, Frequency, HarvestInfo, Schedule,
    SequentialIdGen, SnapshotLimits, StopReason,
};
use hv_storage::StoreError;

type TestRunner = HarvestRunner<FakeClock, SequentialIdGen, FakeNotifier>;

fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2005, 6, 12, 22, 42, 0).unwrap()
}

fn first_event() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2005, 6, 13, 4, 22, 0).unwrap()
}

fn daily() -> Schedule {
    Schedule::new("daily", Frequency::daily_at(1, 4, 22).unwrap()).unwrap()
}

fn domain(name: &str, size: u64) -> Domain {
    Domain::new(DomainConfiguration::new(name, "default", "default_orderxml", size))
}

fn selective(id: &str, members: &[&str]) -> HarvestDefinition {
    HarvestDefinition::selective(
        HarvestId::new(id),
        id,
        &daily(),
        members.iter().map(|d| ConfigRef::new(*d, "default")).collect(),
        created(),
    )
    .unwrap()
}

fn snapshot(id: &str, previous: Option<&str>) -> HarvestDefinition {
    let limits = SnapshotLimits {
        previous: previous.map(HarvestId::new),
        ..SnapshotLimits::default()
    };
    HarvestDefinition::snapshot(HarvestId::new(id), id, limits, created()).unwrap()
}

struct Setup {
    runner: TestRunner,
    store: Arc<HarvestStore>,
    notifier: FakeNotifier,
}

fn setup_with(config: EngineConfig) -> Setup {
    let store = Arc::new(HarvestStore::in_memory());
    store.insert_schedule(daily()).unwrap();
    for (name, size) in [("a.dk", 500), ("b.dk", 1400), ("c.dk", 2400), ("d.dk", 4000)] {
        store.insert_domain(domain(name, size)).unwrap();
    }
    store
        .insert_harvest(selective("hd-1", &["a.dk", "b.dk", "c.dk", "d.dk"]))
        .unwrap();

    let notifier = FakeNotifier::new();
    let runner = HarvestRunner::new(
        RunnerDeps {
            store: Arc::clone(&store),
            clock: FakeClock::at(first_event()),
            id_gen: SequentialIdGen::new("job"),
            notifier: notifier.clone(),
        },
        config,
    );
    Setup {
        runner,
        store,
        notifier,
    }
}

fn setup() -> Setup {
    setup_with(EngineConfig::default())
}

fn hd1() -> HarvestId {
    HarvestId::new("hd-1")
}

// Firing

#[tokio::test]
async fn due_harvest_fires_and_advances() {
    let s = setup();
    let outcome = s.runner.tick(&hd1(), first_event()).await.unwrap();

    let jobs = outcome.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, JobId::new("job-1"));
    assert_eq!(jobs[0].status, JobStatus::New);
    assert_eq!(jobs[0].harvest_num, 1);
    assert_eq!(jobs[0].members.len(), 4);
    assert_eq!(jobs[0].total_expected_size, 8300);

    let stored = s.store.harvest(&hd1()).unwrap();
    assert_eq!(stored.num_events, 1);
    assert_eq!(stored.next_fire_time, Some(first_event() + TimeDelta::days(1)));
    assert_eq!(stored.edition, 2);
    assert_eq!(s.store.jobs_for(&hd1()).len(), 1);
    assert_eq!(s.notifier.names(), vec!["job:created", "harvest:fired"]);
}

#[tokio::test]
async fn configured_limits_split_the_firing() {
    let mut config = EngineConfig::default();
    config.partition.max_relative_size_difference = 4;
    let s = setup_with(config);

    let outcome = s.runner.tick(&hd1(), first_event()).await.unwrap();
    let mut totals: Vec<u64> = outcome.jobs().iter().map(|j| j.total_expected_size).collect();
    totals.sort_unstable();
    assert_eq!(totals, vec![500, 7800]);
}

#[tokio::test]
async fn harvest_before_its_time_is_not_due() {
    let s = setup();
    let early = first_event() - TimeDelta::minutes(1);
    assert_eq!(s.runner.tick(&hd1(), early).await.unwrap(), TickOutcome::NotDue);
    assert_eq!(s.store.harvest(&hd1()).unwrap().num_events, 0);
    assert!(s.notifier.events().is_empty());
}

#[tokio::test]
async fn inactive_harvest_does_not_fire() {
    let s = setup();
    let mut harvest = s.store.harvest(&hd1()).unwrap();
    harvest.active = false;
    s.store.update_harvest(harvest).unwrap();

    assert_eq!(
        s.runner.tick(&hd1(), first_event()).await.unwrap(),
        TickOutcome::Inactive
    );
    assert!(s.store.jobs().is_empty());
}

#[tokio::test]
async fn held_guard_makes_tick_busy() {
    let s = setup();
    let _guard = s.runner.inner.guards.try_acquire(&hd1()).unwrap();
    assert_eq!(
        s.runner.tick(&hd1(), first_event()).await.unwrap(),
        TickOutcome::Busy
    );
    assert!(s.store.jobs().is_empty());
}

#[tokio::test]
async fn missed_events_are_skipped_not_replayed() {
    let s = setup();
    let late = Utc.with_ymd_and_hms(2005, 6, 16, 5, 0, 0).unwrap();

    let outcome = s.runner.tick(&hd1(), late).await.unwrap();
    assert_eq!(outcome.jobs().len(), 1);

    let stored = s.store.harvest(&hd1()).unwrap();
    assert_eq!(stored.num_events, 1);
    assert_eq!(
        stored.next_fire_time,
        Some(Utc.with_ymd_and_hms(2005, 6, 17, 4, 22, 0).unwrap())
    );
    assert!(s.notifier.events().contains(&Event::EventsSkipped {
        harvest_id: hd1(),
        skipped: 3,
    }));
}

#[tokio::test]
async fn last_repeat_exhausts_the_harvest() {
    let s = setup();
    let mut schedule = s.store.schedule("daily").unwrap();
    schedule.max_repeats = Some(1);
    s.store.update_schedule(schedule).unwrap();

    s.runner.tick(&hd1(), first_event()).await.unwrap();
    assert_eq!(s.store.harvest(&hd1()).unwrap().next_fire_time, None);
    assert_eq!(
        s.notifier.names(),
        vec!["job:created", "harvest:fired", "harvest:exhausted"]
    );

    let later = first_event() + TimeDelta::days(2);
    assert_eq!(s.runner.tick(&hd1(), later).await.unwrap(), TickOutcome::NotDue);
}

#[tokio::test]
async fn harvest_without_members_fires_zero_jobs() {
    let s = setup();
    s.store.insert_harvest(selective("empty", &[])).unwrap();
    let id = HarvestId::new("empty");

    let outcome = s.runner.tick(&id, first_event()).await.unwrap();
    assert_eq!(outcome, TickOutcome::Fired { jobs: vec![] });
    assert_eq!(s.store.harvest(&id).unwrap().num_events, 1);
}

#[tokio::test]
async fn failed_firing_changes_nothing() {
    let s = setup();
    // another harvest already owns job-1, which the runner generates next
    s.store.insert_harvest(selective("hd-0", &["a.dk"])).unwrap();
    let other = s.store.harvest(&HarvestId::new("hd-0")).unwrap();
    let plan = PlannedJob {
        template: "default_orderxml".to_string(),
        members: vec![ConfigRef::new("a.dk", "default")],
        caps: other.caps(),
        byte_ceiling: None,
        total_expected_size: 500,
    };
    let taken = Job::from_plan(JobId::new("job-1"), &other, 1, plan, created());
    s.store.commit_firing(other, vec![taken]).unwrap();

    let err = s.runner.tick(&hd1(), first_event()).await.unwrap_err();
    assert!(matches!(err, RunError::Store(StoreError::Duplicate { .. })));

    let stored = s.store.harvest(&hd1()).unwrap();
    assert_eq!(stored.num_events, 0);
    assert_eq!(stored.next_fire_time, Some(first_event()));
    assert!(s.store.jobs_for(&hd1()).is_empty());
    assert!(s.notifier.events().is_empty());
}

#[tokio::test]
async fn notifier_failure_does_not_fail_the_tick() {
    let s = setup();
    s.notifier.set_failing(true);
    let outcome = s.runner.tick(&hd1(), first_event()).await.unwrap();
    assert_eq!(outcome.jobs().len(), 1);
    assert_eq!(s.store.jobs().len(), 1);
}

#[tokio::test]
async fn alias_member_is_covered_by_its_target() {
    let s = setup();
    let mut alias = domain("a.org", 10);
    alias.alias_of = Some("a.dk".to_string());
    s.store.insert_domain(alias).unwrap();
    s.store
        .insert_harvest(selective("aliased", &["a.dk", "a.org"]))
        .unwrap();

    let outcome = s
        .runner
        .tick(&HarvestId::new("aliased"), first_event())
        .await
        .unwrap();
    let members: Vec<String> = outcome.jobs()[0].members.iter().map(|m| m.domain.clone()).collect();
    assert_eq!(members, vec!["a.dk"]);
}

// Concurrent ticking

#[tokio::test]
async fn tick_all_fires_every_due_selective_harvest() {
    let s = setup();
    s.store.insert_harvest(selective("hd-2", &["a.dk"])).unwrap();
    let mut later = selective("hd-3", &["b.dk"]);
    later.next_fire_time = Some(first_event() + TimeDelta::hours(1));
    s.store.insert_harvest(later).unwrap();
    s.store.insert_harvest(snapshot("snap", None)).unwrap();

    let results = s.runner.tick_all(first_event()).await;
    let ids: Vec<&str> = results.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["hd-1", "hd-2"]);
    for (_, result) in &results {
        assert_eq!(result.as_ref().unwrap().jobs().len(), 1);
    }
    assert_eq!(s.store.jobs().len(), 2);
    assert_eq!(s.store.harvest(&HarvestId::new("hd-3")).unwrap().num_events, 0);
}

#[tokio::test]
async fn tick_due_uses_the_runner_clock() {
    let s = setup();
    s.runner.clock().set(first_event() - TimeDelta::hours(1));
    assert!(s.runner.tick_due().await.is_empty());

    s.runner.clock().advance(TimeDelta::hours(1));
    let results = s.runner.tick_due().await;
    assert_eq!(results.len(), 1);
    assert!(results[0].1.is_ok());
}

// Snapshots

#[tokio::test]
async fn snapshot_is_not_ticked() {
    let s = setup();
    s.store.insert_harvest(snapshot("snap", None)).unwrap();
    assert_eq!(
        s.runner.tick(&HarvestId::new("snap"), first_event()).await.unwrap(),
        TickOutcome::Unscheduled
    );
}

#[tokio::test]
async fn snapshot_runs_once_over_every_domain() {
    let s = setup();
    s.store.insert_harvest(snapshot("snap", None)).unwrap();
    let id = HarvestId::new("snap");

    let outcome = s.runner.run_snapshot(&id, first_event()).await.unwrap();
    let members: usize = outcome.jobs().iter().map(|j| j.members.len()).sum();
    assert_eq!(members, 4);

    let stored = s.store.harvest(&id).unwrap();
    assert!(!stored.active);
    assert_eq!(stored.num_events, 1);
    assert_eq!(
        s.runner.run_snapshot(&id, first_event()).await.unwrap(),
        TickOutcome::Inactive
    );
}

#[tokio::test]
async fn snapshot_member_cap_splits_jobs() {
    let mut config = EngineConfig::default();
    config.partition.snapshot_config_count = Some(3);
    let s = setup_with(config);
    s.store.insert_harvest(snapshot("snap", None)).unwrap();

    let outcome = s
        .runner
        .run_snapshot(&HarvestId::new("snap"), first_event())
        .await
        .unwrap();
    let mut sizes: Vec<usize> = outcome.jobs().iter().map(|j| j.members.len()).collect();
    sizes.sort_unstable();
    assert_eq!(sizes, vec![1, 3]);
}

#[tokio::test]
async fn incremental_snapshot_skips_finished_domains() {
    let s = setup();
    s.store.insert_harvest(snapshot("snap-1", None)).unwrap();
    s.store
        .insert_harvest(snapshot("snap-2", Some("snap-1")))
        .unwrap();

    let mut done = s.store.domain("d.dk").unwrap();
    done.record_harvest(HarvestInfo {
        harvest_id: HarvestId::new("snap-1"),
        domain: "d.dk".to_string(),
        config: "default".to_string(),
        date: created(),
        count_objects: 100,
        size_bytes: 4000,
        stop_reason: StopReason::DownloadComplete,
    })
    .unwrap();
    s.store.update_domain(done).unwrap();

    let outcome = s
        .runner
        .run_snapshot(&HarvestId::new("snap-2"), first_event())
        .await
        .unwrap();
    let mut domains: Vec<String> = outcome
        .jobs()
        .iter()
        .flat_map(|j| j.members.iter().map(|m| m.domain.clone()))
        .collect();
    domains.sort();
    assert_eq!(domains, vec!["a.dk", "b.dk", "c.dk"]);
}

#[tokio::test]
async fn selective_harvest_is_not_a_snapshot() {
    let s = setup();
    let err = s.runner.run_snapshot(&hd1(), first_event()).await.unwrap_err();
    assert!(matches!(err, RunError::Harvest(HarvestError::IllegalState(_))));
}

// Jobs

async fn fired_job(s: &Setup) -> Job {
    let outcome = s.runner.tick(&hd1(), first_event()).await.unwrap();
    outcome.jobs()[0].clone()
}

#[tokio::test]
async fn job_walks_forward_and_resubmits() {
    let s = setup();
    let job = fired_job(&s).await;
    let at = first_event();

    s.runner.record_status(&job.id, JobStatus::Submitted, at).await.unwrap();
    s.runner
        .record_status(&job.id, JobStatus::Started, at + TimeDelta::minutes(1))
        .await
        .unwrap();
    let failed = s
        .runner
        .record_status(&job.id, JobStatus::Failed, at + TimeDelta::hours(1))
        .await
        .unwrap();
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.edition, s.store.job(&job.id).unwrap().edition);

    let fresh = s.runner.resubmit(&job.id, at + TimeDelta::hours(2)).await.unwrap();
    assert_eq!(fresh.status, JobStatus::New);
    assert_eq!(fresh.id, JobId::new("job-2"));
    assert_eq!(fresh.members, job.members);

    let old = s.store.job(&job.id).unwrap();
    assert_eq!(old.status, JobStatus::Resubmitted);
    assert_eq!(old.resubmitted_as, Some(fresh.id.clone()));
    assert!(s.notifier.names().contains(&"job:resubmitted"));
}

#[tokio::test]
async fn illegal_transition_leaves_job_untouched() {
    let s = setup();
    let job = fired_job(&s).await;

    let err = s
        .runner
        .record_status(&job.id, JobStatus::Done, first_event())
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Harvest(HarvestError::IllegalState(_))));
    assert_eq!(s.store.job(&job.id).unwrap(), job);

    assert!(s.runner.resubmit(&job.id, first_event()).await.is_err());
    assert_eq!(s.store.jobs().len(), 1);
}

#[tokio::test]
async fn reject_and_unreject_a_failed_job() {
    let s = setup();
    let job = fired_job(&s).await;
    for status in [JobStatus::Submitted, JobStatus::Started, JobStatus::Failed] {
        s.runner.record_status(&job.id, status, first_event()).await.unwrap();
    }

    assert_eq!(s.runner.reject(&job.id).await.unwrap().status, JobStatus::FailedRejected);
    assert_eq!(s.runner.unreject(&job.id).await.unwrap().status, JobStatus::Failed);
}

#[tokio::test]
async fn stop_before_start_is_reported() {
    let s = setup();
    let job = fired_job(&s).await;
    let at = first_event();
    s.runner.record_status(&job.id, JobStatus::Submitted, at).await.unwrap();
    s.runner
        .record_status(&job.id, JobStatus::Started, at + TimeDelta::hours(1))
        .await
        .unwrap();
    let done = s.runner.record_status(&job.id, JobStatus::Done, at).await.unwrap();

    assert_eq!(done.status, JobStatus::Done);
    assert!(s.notifier.names().contains(&"job:timing"));
}

// Administration

#[tokio::test]
async fn reset_restarts_the_schedule() {
    let s = setup();
    s.runner.tick(&hd1(), first_event()).await.unwrap();

    let now = Utc.with_ymd_and_hms(2005, 7, 1, 12, 0, 0).unwrap();
    let reset = s.runner.reset(&hd1(), now).await.unwrap();
    assert_eq!(reset.num_events, 0);
    assert_eq!(
        reset.next_fire_time,
        Some(Utc.with_ymd_and_hms(2005, 7, 2, 4, 22, 0).unwrap())
    );
    assert_eq!(s.store.harvest(&hd1()).unwrap(), reset);
}

#[tokio::test]
async fn snapshot_cannot_be_reset() {
    let s = setup();
    s.store.insert_harvest(snapshot("snap", None)).unwrap();
    assert!(s.runner.reset(&HarvestId::new("snap"), first_event()).await.is_err());
}

// Retry

fn stale() -> RunError {
    RunError::Store(StoreError::StaleWrite {
        kind: "harvest",
        id: "hd-1".to_string(),
        expected: 1,
        found: 2,
    })
}

#[test]
fn stale_writes_are_retried_until_success() {
    let s = setup();
    let mut calls = 0;
    let result = s.runner.with_retry("hd-1", || {
        calls += 1;
        if calls < 3 {
            Err(stale())
        } else {
            Ok(calls)
        }
    });
    assert_eq!(result.unwrap(), 3);
}

#[test]
fn retries_are_bounded() {
    let s = setup();
    let mut calls = 0u32;
    let err = s
        .runner
        .with_retry("hd-1", || -> Result<(), RunError> {
            calls += 1;
            Err(stale())
        })
        .unwrap_err();
    assert_eq!(calls, 3);
    assert!(matches!(err, RunError::RetriesExhausted { attempts: 3, .. }));
}

#[test]
fn other_errors_are_not_retried() {
    let s = setup();
    let mut calls = 0u32;
    let err = s
        .runner
        .with_retry("hd-1", || -> Result<(), RunError> {
            calls += 1;
            Err(RunError::Config("boom".to_string()))
        })
        .unwrap_err();
    assert_eq!(calls, 1);
    assert!(matches!(err, RunError::Config(_)));
}
