//! Side channel for failures that are recovered instead of returned.
//!
//! Search clients never hand transport errors to their callers; they fall
//! back to demo data and record what went wrong here.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Events retained before the oldest are dropped.
pub const DEFAULT_CAPACITY: usize = 50;

/// One recovered failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEvent {
    /// Which stage failed, e.g. `shopping.timeout` or `image.unreachable`.
    pub stage: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Bounded, shareable log of [`DiagnosticEvent`]s. Clones share storage.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    events: Arc<Mutex<VecDeque<DiagnosticEvent>>>,
    capacity: usize,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    /// Record an event and emit it as a `warn` log line.
    pub fn record(&self, stage: impl Into<String>, message: impl Into<String>) {
        let event = DiagnosticEvent {
            stage: stage.into(),
            message: message.into(),
            at: Utc::now(),
        };
        tracing::warn!(stage = %event.stage, message = %event.message, "recovered failure");

        let mut events = self.events.lock().unwrap_or_else(|p| p.into_inner());
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Most recent event.
    pub fn last(&self) -> Option<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .back()
            .cloned()
    }

    /// All retained events, oldest first.
    pub fn snapshot(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .iter()
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clear();
    }
}
