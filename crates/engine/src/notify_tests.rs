// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hv_core::{HarvestId, JobId};

fn created() -> Event {
    Event::JobCreated {
        job_id: JobId::new("job-1"),
        harvest_id: HarvestId::new("hd-1"),
    }
}

#[tokio::test]
async fn tracing_and_noop_notifiers_accept_everything() {
    let skipped = Event::EventsSkipped {
        harvest_id: HarvestId::new("hd-1"),
        skipped: 3,
    };
    assert!(TracingNotifier.notify(&created()).await.is_ok());
    assert!(TracingNotifier.notify(&skipped).await.is_ok());
    assert!(NoOpNotifier.notify(&skipped).await.is_ok());
}

#[tokio::test]
async fn fake_records_events_in_order() {
    let fake = FakeNotifier::new();
    fake.notify(&created()).await.unwrap();
    fake.notify(&Event::HarvestExhausted {
        harvest_id: HarvestId::new("hd-1"),
    })
    .await
    .unwrap();
    assert_eq!(fake.names(), vec!["job:created", "harvest:exhausted"]);
}

#[tokio::test]
async fn failing_fake_still_records() {
    let fake = FakeNotifier::new();
    fake.set_failing(true);
    assert!(fake.notify(&created()).await.is_err());
    assert_eq!(fake.events().len(), 1);
}
