use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

use crate::sync::{Condvar, Mutex};
use crate::HandoffError;

/// A queued acquirer. Each waiter parks on its own condition variable so a
/// release wakes exactly the head of the queue.
struct Waiter {
    ticket: u64,
    wake: Condvar,
}

struct LockState {
    locked: bool,
    cancelled: bool,
    next_ticket: u64,
    queue: VecDeque<Arc<Waiter>>,
}

impl LockState {
    fn is_head(&self, ticket: u64) -> bool {
        self.queue.front().is_some_and(|head| head.ticket == ticket)
    }

    fn wake_head(&self) {
        if let Some(head) = self.queue.front() {
            head.wake.notify_one();
        }
    }
}

/// Mutual exclusion with strict FIFO admission among blocked threads.
///
/// A thread calling [`FairLock::acquire`] takes a ticket at the tail of the
/// wait queue and is admitted only once it is at the head of the queue and the
/// lock is free. A free lock is never claimed by a newcomer while older
/// tickets are still queued, so the waiter released next is always the one
/// that has waited longest.
///
/// [`FairLock::release`] does not have to be called by the holder. A lock
/// created with [`FairLock::locked`] behaves as a FIFO binary semaphore: each
/// release hands one permit to the head waiter, which is how the cursor pairs
/// every item put into the slot with exactly one admitted consumer.
pub struct FairLock {
    state: Mutex<LockState>,
}

impl Default for FairLock {
    fn default() -> Self {
        Self::new()
    }
}

impl FairLock {
    /// Create a lock that is free.
    pub fn new() -> Self {
        Self::with_state(false)
    }

    /// Create a lock that is already held; the first acquirer waits for a
    /// release.
    pub fn locked() -> Self {
        Self::with_state(true)
    }

    fn with_state(locked: bool) -> Self {
        FairLock {
            state: Mutex::new(LockState {
                locked,
                cancelled: false,
                next_ticket: 0,
                queue: VecDeque::new(),
            }),
        }
    }

    /// Block until this thread is the oldest waiter and the lock is free,
    /// then claim it.
    ///
    /// # Errors
    /// Returns [`HandoffError::Cancelled`] if the lock was cancelled before or
    /// while waiting. The caller's ticket is removed from the queue either way.
    pub fn acquire(&self) -> Result<(), HandoffError> {
        let mut state = self.state.lock();
        if state.cancelled {
            return Err(HandoffError::Cancelled);
        }
        if state.queue.is_empty() && !state.locked {
            state.locked = true;
            return Ok(());
        }

        let waiter = Arc::new(Waiter {
            ticket: state.next_ticket,
            wake: Condvar::new(),
        });
        state.next_ticket += 1;
        state.queue.push_back(waiter.clone());
        trace!(
            ticket = waiter.ticket,
            queued = state.queue.len(),
            "fair lock waiter queued"
        );

        loop {
            if state.cancelled {
                state.queue.retain(|w| w.ticket != waiter.ticket);
                state.wake_head();
                trace!(ticket = waiter.ticket, "fair lock waiter cancelled");
                return Err(HandoffError::Cancelled);
            }
            if !state.locked && state.is_head(waiter.ticket) {
                state.locked = true;
                state.queue.pop_front();
                trace!(ticket = waiter.ticket, "fair lock waiter admitted");
                return Ok(());
            }
            waiter.wake.wait(&mut state);
        }
    }

    /// Claim the lock without blocking.
    ///
    /// Succeeds only when the lock is free and nobody is queued, so it never
    /// overtakes a waiter.
    pub fn try_acquire(&self) -> Result<bool, HandoffError> {
        let mut state = self.state.lock();
        if state.cancelled {
            return Err(HandoffError::Cancelled);
        }
        if state.queue.is_empty() && !state.locked {
            state.locked = true;
            return Ok(true);
        }
        Ok(false)
    }

    /// Free the lock and wake the head of the queue. Safe to call when no one
    /// is waiting.
    pub fn release(&self) {
        let mut state = self.state.lock();
        state.locked = false;
        state.wake_head();
    }

    /// Permanently cancel the lock: every queued waiter and every later
    /// acquire fails with [`HandoffError::Cancelled`].
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        state.cancelled = true;
        for waiter in &state.queue {
            waiter.wake.notify_one();
        }
        trace!(queued = state.queue.len(), "fair lock cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.lock().cancelled
    }

    pub fn is_locked(&self) -> bool {
        self.state.lock().locked
    }

    /// Number of threads currently queued for admission.
    pub fn queued(&self) -> usize {
        self.state.lock().queue.len()
    }
}
