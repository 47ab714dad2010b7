//! Reconciles the per-kind event queues into one deterministic execution
//! sequence. Input callbacks land in whichever queue matches their kind, at
//! whatever time the shell delivered them; once per frame everything is
//! drained, merged by enqueue timestamp, and executed in that order on the
//! frame thread.

use web_time::Instant;

use crate::input::{KeyPress, KeyboardState, TouchState};
use crate::queue::{EventAction, EventItem, EventQueue};

pub struct EventResolver {
    touch_down: EventQueue<TouchState>,
    touch_move: EventQueue<TouchState>,
    touch_up: EventQueue<TouchState>,
    key_down: EventQueue<KeyboardState>,
    key_up: EventQueue<KeyboardState>,
    key_press: EventQueue<KeyPress>,
}

impl EventResolver {
    pub fn new() -> Self {
        EventResolver {
            touch_down: EventQueue::new(),
            touch_move: EventQueue::new(),
            touch_up: EventQueue::new(),
            key_down: EventQueue::new(),
            key_up: EventQueue::new(),
            key_press: EventQueue::new(),
        }
    }

    pub fn add_touch_down(&self, state: TouchState, action: EventAction<TouchState>) {
        self.touch_down.enqueue(state, action);
    }

    pub fn add_touch_move(&self, state: TouchState, action: EventAction<TouchState>) {
        self.touch_move.enqueue(state, action);
    }

    pub fn add_touch_up(&self, state: TouchState, action: EventAction<TouchState>) {
        self.touch_up.enqueue(state, action);
    }

    pub fn add_key_down(&self, state: KeyboardState, action: EventAction<KeyboardState>) {
        self.key_down.enqueue(state, action);
    }

    pub fn add_key_up(&self, state: KeyboardState, action: EventAction<KeyboardState>) {
        self.key_up.enqueue(state, action);
    }

    pub fn add_key_press(&self, state: KeyPress, action: EventAction<KeyPress>) {
        self.key_press.enqueue(state, action);
    }

    /// Drains every queue, merges the items by enqueue time (ascending,
    /// across all kinds), and executes them. The sort is stable, so items
    /// with identical timestamps keep their drain order.
    pub fn invoke(&self) {
        let mut batch: Vec<(Instant, Box<dyn FnOnce()>)> = Vec::new();

        collect(&mut batch, self.touch_down.take());
        collect(&mut batch, self.touch_move.take());
        collect(&mut batch, self.touch_up.take());
        collect(&mut batch, self.key_down.take());
        collect(&mut batch, self.key_up.take());
        collect(&mut batch, self.key_press.take());

        batch.sort_by_key(|(at, _)| *at);

        for (_, thunk) in batch {
            thunk();
        }
    }
}

impl Default for EventResolver {
    fn default() -> Self {
        EventResolver::new()
    }
}

fn collect<S: 'static>(batch: &mut Vec<(Instant, Box<dyn FnOnce()>)>, items: Vec<EventItem<S>>) {
    for item in items {
        batch.push((item.at, Box::new(move || (item.action)(&item.state))));
    }
}
