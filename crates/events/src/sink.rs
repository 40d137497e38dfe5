//! Synchronous event consumers.
//!
//! Unlike a broadcast channel, delivery through an [`EventSink`] never
//! drops an event: the worker pool relies on every terminal job outcome
//! reaching the console and the audit log exactly once.

use std::sync::Arc;

use crate::event::RunEvent;

/// Consumer of run events. Called from worker tasks, so implementations
/// must be cheap and must not block for long.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RunEvent);
}

/// Forwards every event to each wrapped sink, in registration order.
#[derive(Default, Clone)]
pub struct EventFanout {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for EventFanout {
    fn emit(&self, event: &RunEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
