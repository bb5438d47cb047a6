//! Activity log boundary.
//!
//! Append-only audit sink, consumed fire-and-forget: a failed write is
//! logged locally at `warn` and never blocks or fails the operation that
//! produced it.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// The audit sink was unavailable or rejected the entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("activity log unavailable: {0}")]
pub struct ActivityLogError(pub String);

/// Append-only audit sink.
pub trait ActivityLog: Send + Sync {
    fn record(&self, actor: &str, action: &str, description: &str)
    -> Result<(), ActivityLogError>;
}

/// Record to `log`, swallowing (but tracing) failures.
///
/// The one sanctioned way to call an [`ActivityLog`] from the checkout and
/// lifecycle paths.
pub fn record_best_effort(log: &dyn ActivityLog, actor: &str, action: &str, description: &str) {
    if let Err(e) = log.record(actor, action, description) {
        tracing::warn!(error = %e, action, "activity log write failed");
    }
}

/// Production sink: emits structured tracing events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingActivityLog;

impl ActivityLog for TracingActivityLog {
    fn record(
        &self,
        actor: &str,
        action: &str,
        description: &str,
    ) -> Result<(), ActivityLogError> {
        tracing::info!(actor, action, description, "activity");
        Ok(())
    }
}

/// One recorded audit entry (in-memory sink).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub actor: String,
    pub action: String,
    pub description: String,
    pub at: DateTime<Utc>,
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl ActivityLog for InMemoryActivityLog {
    fn record(
        &self,
        actor: &str,
        action: &str,
        description: &str,
    ) -> Result<(), ActivityLogError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ActivityEntry {
                actor: actor.to_string(),
                action: action.to_string(),
                description: description.to_string(),
                at: Utc::now(),
            });
        Ok(())
    }
}
