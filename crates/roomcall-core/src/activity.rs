use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::events::{EventEmitter, RoomcallEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// On-screen activity panel.
///
/// Every entry is kept for the session and broadcast to listeners so the
/// native UI can append it to its log view.
#[derive(Clone)]
pub struct ActivityLog {
    entries: Arc<Mutex<Vec<ActivityEntry>>>,
    emitter: EventEmitter,
}

impl ActivityLog {
    pub fn new(emitter: EventEmitter) -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
            emitter,
        }
    }

    pub fn log(&self, message: impl Into<String>) {
        let entry = ActivityEntry {
            timestamp: Utc::now(),
            message: message.into(),
        };
        tracing::info!(target: "roomcall_core::activity", "{}", entry.message);
        self.entries
            .lock()
            .expect("activity lock poisoned")
            .push(entry.clone());
        self.emitter.emit(RoomcallEvent::ActivityLogged(entry));
    }

    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().expect("activity lock poisoned").clone()
    }

    pub fn clear(&self) {
        self.entries.lock().expect("activity lock poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ChannelListener;

    #[test]
    fn log_appends_entries_in_order() {
        let log = ActivityLog::new(EventEmitter::new());
        log.log("Joining room 'a'...");
        log.log("Left");

        let messages: Vec<String> = log.entries().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["Joining room 'a'...", "Left"]);
    }

    #[test]
    fn log_broadcasts_entry() {
        let emitter = EventEmitter::new();
        let (listener, mut rx) = ChannelListener::new();
        emitter.add_listener(listener);
        let log = ActivityLog::new(emitter);

        log.log("hello");

        match rx.try_recv().unwrap() {
            RoomcallEvent::ActivityLogged(entry) => assert_eq!(entry.message, "hello"),
            other => panic!("expected ActivityLogged, got {other:?}"),
        }
    }

    #[test]
    fn clear_empties_log() {
        let log = ActivityLog::new(EventEmitter::new());
        log.log("x");
        log.clear();
        assert!(log.entries().is_empty());
    }
}
