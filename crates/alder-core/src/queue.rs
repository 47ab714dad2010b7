//! Bounded, thread-safe buffer of pending event dispatches for one event
//! kind. Producers are the host shell's input callbacks (arbitrarily
//! concurrent); the single consumer is the frame loop, which drains the
//! whole queue at the frame boundary. A full queue drops the newest item
//! rather than blocking: input callbacks must never stall the host's UI
//! thread.

use std::sync::Arc;

use parking_lot::RwLock;
use web_time::Instant;

pub const MAX_PENDING: usize = 50;

pub type EventAction<S> = Arc<dyn Fn(&S) + Send + Sync>;

/// One pending dispatch: the callback, the state snapshot it will receive,
/// and the wall-clock enqueue time used for cross-kind ordering.
pub struct EventItem<S> {
    pub action: EventAction<S>,
    pub state: S,
    pub at: Instant,
}

pub struct EventQueue<S> {
    items: RwLock<Vec<EventItem<S>>>,
}

impl<S> EventQueue<S> {
    pub fn new() -> Self {
        EventQueue {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Appends an item stamped with the current time. Once the queue holds
    /// `MAX_PENDING` items the newly appended one is removed again
    /// (tail-drop).
    pub fn enqueue(&self, state: S, action: EventAction<S>) {
        let mut items = self.items.write();
        items.push(EventItem {
            action,
            state,
            at: Instant::now(),
        });
        if items.len() > MAX_PENDING {
            items.pop();
            log::warn!("event queue full ({MAX_PENDING} pending); dropping newest item");
        }
    }

    pub fn count(&self) -> usize {
        self.items.read().len()
    }

    /// Atomically removes and returns every pending item in insertion order.
    pub fn take(&self) -> Vec<EventItem<S>> {
        std::mem::take(&mut *self.items.write())
    }
}

impl<S> Default for EventQueue<S> {
    fn default() -> Self {
        EventQueue::new()
    }
}
