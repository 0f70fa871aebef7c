use std::iter::Peekable;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace};

use crate::listener::{DeliveryMode, ErrorListener};
use crate::source::{Source, SourceError};
use crate::state::Shared;

pub(crate) enum ReaderState<B: Iterator> {
    Fetching,
    Delivering(Peekable<B>),
    Idling,
    Backoff(SourceError),
    Stopped,
}

impl<B: Iterator> ReaderState<B> {
    fn name(&self) -> &'static str {
        match self {
            ReaderState::Fetching => "fetching",
            ReaderState::Delivering(_) => "delivering",
            ReaderState::Idling => "idling",
            ReaderState::Backoff(_) => "backoff",
            ReaderState::Stopped => "stopped",
        }
    }
}

/// Background loop that drains the source into the handoff slot or the item
/// listener until the cursor stops.
pub(crate) struct ReaderLoop<S: Source> {
    source: S,
    shared: Arc<Shared<S::Item>>,
    mode: DeliveryMode<S::Item>,
    error_listener: Option<Arc<dyn ErrorListener>>,
    no_data_sleep: Duration,
    error_sleep: Duration,
}

impl<S: Source> ReaderLoop<S> {
    pub(crate) fn new(
        source: S,
        shared: Arc<Shared<S::Item>>,
        mode: DeliveryMode<S::Item>,
        error_listener: Option<Arc<dyn ErrorListener>>,
        no_data_sleep: Duration,
        error_sleep: Duration,
    ) -> Self {
        ReaderLoop {
            source,
            shared,
            mode,
            error_listener,
            no_data_sleep,
            error_sleep,
        }
    }

    pub(crate) fn run(mut self) {
        debug!(source = %self.source.name(), mode = ?self.mode, "reader started");
        let mut state = ReaderState::Fetching;
        loop {
            if !self.shared.state.is_running() {
                break;
            }
            state = self.step(state);
            trace!(state = state.name(), "reader transition");
            if matches!(state, ReaderState::Stopped) {
                break;
            }
        }
        debug!(source = %self.source.name(), "reader stopped");
    }

    pub(crate) fn step(&mut self, state: ReaderState<S::Batch>) -> ReaderState<S::Batch> {
        match state {
            ReaderState::Fetching => self.fetch(),
            ReaderState::Delivering(batch) => self.deliver(batch),
            ReaderState::Idling => self.pause(self.no_data_sleep),
            ReaderState::Backoff(e) => {
                self.report(&e);
                self.pause(self.error_sleep)
            }
            ReaderState::Stopped => ReaderState::Stopped,
        }
    }

    fn fetch(&mut self) -> ReaderState<S::Batch> {
        let fetched = self.source.open(&self.shared.shutdown);
        if self.shared.shutdown.is_triggered() {
            return ReaderState::Stopped;
        }
        match fetched {
            Ok(batch) => {
                let mut batch = batch.peekable();
                if batch.peek().is_none() {
                    ReaderState::Idling
                } else {
                    ReaderState::Delivering(batch)
                }
            }
            Err(e) => ReaderState::Backoff(e),
        }
    }

    fn deliver(&mut self, mut batch: Peekable<S::Batch>) -> ReaderState<S::Batch> {
        while self.shared.state.is_running() {
            let item = match batch.next() {
                Some(Ok(item)) => item,
                Some(Err(e)) => return ReaderState::Backoff(e),
                None => return ReaderState::Fetching,
            };
            match &self.mode {
                DeliveryMode::Push(listener) => {
                    if let Err(e) = listener.on_item(item) {
                        return ReaderState::Backoff(e.into());
                    }
                }
                DeliveryMode::Pull => {
                    if self.shared.slot.put(item).is_err() {
                        return ReaderState::Stopped;
                    }
                    self.shared.lock.release();
                    trace!("item handed off");
                }
            }
        }
        ReaderState::Stopped
    }

    /// Sleep before the next fetch; a stop during the sleep ends the loop.
    fn pause(&self, duration: Duration) -> ReaderState<S::Batch> {
        if duration.is_zero() || self.shared.shutdown.sleep(duration) {
            ReaderState::Fetching
        } else {
            ReaderState::Stopped
        }
    }

    fn report(&self, e: &SourceError) {
        match &self.error_listener {
            Some(listener) => {
                if catch_unwind(AssertUnwindSafe(|| listener.on_error(e))).is_err() {
                    error!(
                        error = %e,
                        "error listener panicked while handling source failure"
                    );
                }
            }
            None => error!(source = %self.source.name(), error = %e, "source failure"),
        }
    }
}
