//! Recording observer for lifecycle assertions.

use std::sync::{Arc, Mutex};

use lakerunner_core::{
    FailureKind, ToolEndEvent, ToolErrorEvent, ToolObserver, ToolStartEvent,
};

/// One captured lifecycle event, in arrival order.
#[derive(Debug, Clone)]
pub enum RecordedEvent {
    Start(ToolStartEvent),
    End(ToolEndEvent),
    Error(ToolErrorEvent),
}

impl RecordedEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Start(_))
    }
}

/// Observer that records every event it sees.
///
/// Clones share the same underlying history, so a test can keep one handle
/// while handing another to the runner.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events in arrival order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Captured start inputs, in order.
    pub fn starts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RecordedEvent::Start(e) => Some(e.input),
                _ => None,
            })
            .collect()
    }

    /// Captured end outputs, in order.
    pub fn ends(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RecordedEvent::End(e) => Some(e.output),
                _ => None,
            })
            .collect()
    }

    /// Captured error renderings with their failure kinds, in order.
    pub fn errors(&self) -> Vec<(String, FailureKind)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                RecordedEvent::Error(e) => Some((e.error, e.kind)),
                _ => None,
            })
            .collect()
    }

    /// Number of terminal events (ends plus errors).
    pub fn terminal_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| event.is_terminal())
            .count()
    }

    /// Assert the exactly-one-terminal-event invariant for `calls` runs.
    ///
    /// # Panics
    ///
    /// Panics when the captured history violates the invariant.
    pub fn assert_one_terminal_per_call(&self, calls: usize) {
        let starts = self.starts().len();
        let terminals = self.terminal_count();
        assert_eq!(
            starts, calls,
            "expected {calls} start events, saw {starts}"
        );
        assert_eq!(
            terminals, calls,
            "expected {calls} terminal events, saw {terminals}"
        );
    }

    /// Forget all captured events.
    pub fn reset(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl ToolObserver for RecordingObserver {
    fn on_tool_start(&self, event: &ToolStartEvent) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedEvent::Start(event.clone()));
    }

    fn on_tool_end(&self, event: &ToolEndEvent) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedEvent::End(event.clone()));
    }

    fn on_tool_error(&self, event: &ToolErrorEvent) {
        self.events
            .lock()
            .unwrap()
            .push(RecordedEvent::Error(event.clone()));
    }
}
