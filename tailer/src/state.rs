use handoff::{FairLock, HandoffSlot};
use std::sync::atomic::{AtomicU8, Ordering};

use crate::shutdown::Shutdown;

/// Lifecycle of a cursor. `Stopped` is terminal: a cursor runs at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Running = 1,
    Stopped = 2,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RunState::Idle,
            1 => RunState::Running,
            _ => RunState::Stopped,
        }
    }
}

pub(crate) struct AtomicRunState(AtomicU8);

impl AtomicRunState {
    pub(crate) fn new() -> Self {
        AtomicRunState(AtomicU8::new(RunState::Idle as u8))
    }

    pub(crate) fn load(&self) -> RunState {
        RunState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn is_running(&self) -> bool {
        self.load() == RunState::Running
    }

    /// Move from `from` to `to`; on mismatch returns the actual state.
    pub(crate) fn transition(&self, from: RunState, to: RunState) -> Result<(), RunState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(RunState::from_u8)
    }
}

/// State shared by the cursor facade and its reader thread.
pub(crate) struct Shared<T> {
    pub(crate) state: AtomicRunState,
    pub(crate) lock: FairLock,
    pub(crate) slot: HandoffSlot<T>,
    pub(crate) shutdown: Shutdown,
}

impl<T> Shared<T> {
    pub(crate) fn new() -> Self {
        Shared {
            state: AtomicRunState::new(),
            lock: FairLock::locked(),
            slot: HandoffSlot::new(),
            shutdown: Shutdown::new(),
        }
    }
}
