// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery of harvest events to the outside world

use async_trait::async_trait;
use hv_core::Event;
use thiserror::Error;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeNotifier;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification failed: {0}")]
    Failed(String),
}

/// Receives every event a runner produces, after the change is committed
#[async_trait]
pub trait Notifier: Clone + Send + Sync + 'static {
    async fn notify(&self, event: &Event) -> Result<(), NotifyError>;
}

/// Writes events to the log; warnings at warn level
#[derive(Clone, Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, event: &Event) -> Result<(), NotifyError> {
        let detail = serde_json::to_string(event).map_err(|e| NotifyError::Failed(e.to_string()))?;
        if event.is_warning() {
            tracing::warn!(event = event.name(), %detail, "harvest event");
        } else {
            tracing::info!(event = event.name(), %detail, "harvest event");
        }
        Ok(())
    }
}

/// Drops every event
#[derive(Clone, Debug, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, _event: &Event) -> Result<(), NotifyError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
