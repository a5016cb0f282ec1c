//! Bounded FIFO offer buffer with blocking drain (C2).
//!
//! Multiple producer threads call [`OfferQueue::offer`]; one consumer
//! thread calls [`OfferQueue::take_all`] in a loop. Capacity zero means
//! unbounded — confirmed by the design note that nothing downstream relies
//! on boundedness for back-pressure, so an unbounded queue simply never
//! rejects.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::model::{Offer, OfferId};

struct State {
    items: VecDeque<Offer>,
    shutdown: bool,
}

pub struct OfferQueue {
    capacity: usize,
    state: Mutex<State>,
    not_empty: Condvar,
}

impl OfferQueue {
    /// `capacity == 0` means unbounded.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Mutex::new(State {
                items: VecDeque::new(),
                shutdown: false,
            }),
            not_empty: Condvar::new(),
        }
    }

    fn is_bounded(&self) -> bool {
        self.capacity > 0
    }

    /// Attempts to enqueue one offer. Returns `false` without blocking if
    /// the queue is bounded and full.
    pub fn offer(&self, offer: Offer) -> bool {
        let mut state = self.state.lock();
        if self.is_bounded() && state.items.len() >= self.capacity {
            return false;
        }
        state.items.push_back(offer);
        self.not_empty.notify_one();
        true
    }

    /// Best-effort removal of a queued offer by id, used when the cluster
    /// manager rescinds an offer before it's drained. Returns whether an
    /// entry was removed.
    pub fn remove(&self, id: &OfferId) -> bool {
        let mut state = self.state.lock();
        let before = state.items.len();
        state.items.retain(|o| &o.id != id);
        state.items.len() != before
    }

    /// Blocks until at least one offer is buffered, then atomically drains
    /// and returns everything currently buffered. Returns an empty vector
    /// only when the queue has been shut down — the consumer treats that as
    /// a spurious wake and must re-check its own shutdown condition.
    pub fn take_all(&self) -> Vec<Offer> {
        let mut state = self.state.lock();
        while state.items.is_empty() && !state.shutdown {
            self.not_empty.wait(&mut state);
        }
        state.items.drain(..).collect()
    }

    /// Wakes any thread blocked in `take_all` with an empty result,
    /// allowing the consumer loop to observe shutdown and exit cleanly.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shutdown = true;
        self.not_empty.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
