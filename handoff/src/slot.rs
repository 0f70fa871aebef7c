use tracing::trace;

use crate::sync::{Condvar, Mutex};
use crate::HandoffError;

struct SlotState<T> {
    item: Option<T>,
    closed: bool,
}

/// A buffer holding at most one item.
///
/// The producer blocks in [`HandoffSlot::put`] while the slot is occupied, so
/// a slow consumer throttles the producer instead of letting items pile up.
/// Consumers never block here; they poll with [`HandoffSlot::try_take`] and do
/// their waiting elsewhere.
pub struct HandoffSlot<T> {
    state: Mutex<SlotState<T>>,
    drained: Condvar,
}

impl<T> Default for HandoffSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> HandoffSlot<T> {
    pub fn new() -> Self {
        HandoffSlot {
            state: Mutex::new(SlotState {
                item: None,
                closed: false,
            }),
            drained: Condvar::new(),
        }
    }

    /// Place `item` in the slot, waiting for the previous item to be taken.
    ///
    /// # Errors
    /// Returns [`HandoffError::Closed`] if the slot is closed before the item
    /// could be placed; the item is dropped.
    pub fn put(&self, item: T) -> Result<(), HandoffError> {
        let mut state = self.state.lock();
        while state.item.is_some() && !state.closed {
            trace!("handoff slot occupied, producer waiting");
            self.drained.wait(&mut state);
        }
        if state.closed {
            return Err(HandoffError::Closed);
        }
        state.item = Some(item);
        Ok(())
    }

    /// Take the item if one is present, without blocking.
    pub fn try_take(&self) -> Option<T> {
        let mut state = self.state.lock();
        let item = state.item.take();
        if item.is_some() {
            self.drained.notify_one();
        }
        item
    }

    /// Refuse further puts and release a producer blocked in [`put`](Self::put).
    /// An item already in the slot can still be taken.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.drained.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn is_occupied(&self) -> bool {
        self.state.lock().item.is_some()
    }
}
