//! Event reporting for the scan engine and the seen-article stores.
//!
//! Components emit [`Event`]s to an injected [`Observer`] rather than logging
//! through a global handle, so tests can inspect what happened without
//! installing a subscriber.

use std::sync::Mutex;
use chrono::{DateTime, Utc};
use crate::types::ScanReport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    EngineStarted { feeds: usize, interval_secs: u64, cutoff: DateTime<Utc> },
    PassStarted { feeds: usize },
    FetchFailed { url: String, error: String },
    ArticleNotified { id: String, title: String, link: String },
    NotifyFailed { id: String, error: String },
    LookupFailed { id: String, error: String },
    RecordFailed { id: String, error: String },
    PassFinished(ScanReport),
    EngineStopped { passes: u64 },
    StoreOpened { backend: String, records: u64 },
    StoreRetry { attempt: u32, max_attempts: u32, error: String },
}

pub trait Observer: Send + Sync {
    fn observe(&self, event: Event);
}

/// Discards every event.
pub struct NullObserver;

impl Observer for NullObserver {
    fn observe(&self, _event: Event) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    pub fn count_matching(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl Observer for Recorder {
    fn observe(&self, event: Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_keeps_order() {
        let recorder = Recorder::new();
        recorder.observe(Event::PassStarted { feeds: 2 });
        recorder.observe(Event::FetchFailed {
            url: "https://example.com/feed".to_string(),
            error: "timeout".to_string(),
        });
        recorder.observe(Event::PassFinished(ScanReport::default()));

        let events = recorder.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], Event::PassStarted { feeds: 2 });
        assert_eq!(recorder.count_matching(|e| matches!(e, Event::FetchFailed { .. })), 1);
    }
}
