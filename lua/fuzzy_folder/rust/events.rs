use crate::picker::QuickPick;
use crate::types::{PickerEvent, RequestId};
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::error;

/// A `QuickPick` that queues widget updates for a single-threaded host to
/// drain, since filter results arrive on worker threads.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Mutex<VecDeque<PickerEvent>>,
    ready: Condvar,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: PickerEvent) {
        match self.events.lock() {
            Ok(mut events) => {
                events.push_back(event);
                self.ready.notify_all();
            }
            Err(e) => error!("Event queue lock poisoned, dropping {:?}: {}", event, e),
        }
    }

    pub fn drain(&self) -> Vec<PickerEvent> {
        match self.events.lock() {
            Ok(mut events) => events.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Blocks until at least one event is queued or `timeout` passes, then drains.
    pub fn wait(&self, timeout: Duration) -> Vec<PickerEvent> {
        let deadline = Instant::now() + timeout;
        let Ok(mut events) = self.events.lock() else {
            return Vec::new();
        };

        while events.is_empty() {
            let now = Instant::now();
            if now >= deadline {
                return Vec::new();
            }
            events = match self.ready.wait_timeout(events, deadline - now) {
                Ok((guard, _)) => guard,
                Err(_) => return Vec::new(),
            };
        }

        events.drain(..).collect()
    }
}

impl QuickPick for EventQueue {
    fn show(&self, items: Vec<String>) {
        self.push(PickerEvent::Show { items });
    }

    fn set_items(&self, request: RequestId, query: &str, items: Vec<String>) {
        self.push(PickerEvent::Items {
            request,
            query: query.to_string(),
            items,
        });
    }

    fn hide(&self) {
        self.push(PickerEvent::Hide);
    }

    fn show_error(&self, message: &str) {
        self.push(PickerEvent::Error {
            message: message.to_string(),
        });
    }
}
