//! Test helpers shared across crates (enabled with the `test-utils` feature).

use std::sync::Mutex;

use crate::ports::{InterceptEvent, InterceptEventSink};

/// Records every emitted event for later assertions.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<InterceptEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<InterceptEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl InterceptEventSink for RecordingEventSink {
    fn emit(&self, event: InterceptEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
