use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::listener::{DeliveryMode, ErrorListener, ItemListener};
use crate::options::CursorOptions;
use crate::reader::ReaderLoop;
use crate::source::Source;
use crate::state::{RunState, Shared};
use crate::{CursorError, Result};

/// Blocking pull interface over a live [`Source`].
///
/// The cursor is `Sync`; share it between consumer threads with an `Arc`.
pub struct Cursor<S: Source> {
    shared: Arc<Shared<S::Item>>,
    push: bool,
    thread_name: String,
    pending: Mutex<Option<ReaderLoop<S>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

pub struct CursorBuilder<S: Source> {
    source: S,
    options: CursorOptions,
    mode: DeliveryMode<S::Item>,
    error_listener: Option<Arc<dyn ErrorListener>>,
}

impl<S: Source> CursorBuilder<S> {
    /// Deliver every source failure to `listener` instead of the log.
    pub fn error_listener<L>(mut self, listener: L) -> Self
    where
        L: ErrorListener + 'static,
    {
        self.error_listener = Some(Arc::new(listener));
        self
    }

    /// Switch to push mode: items go to `listener` on the reader thread and
    /// [`Cursor::next`] is disabled.
    pub fn item_listener<L>(mut self, listener: L) -> Self
    where
        L: ItemListener<S::Item> + 'static,
    {
        self.mode = DeliveryMode::Push(Arc::new(listener));
        self
    }

    /// Check the source exists, provisioning it unless
    /// `assert_if_missing` is set, and build the cursor.
    pub fn build(self) -> Result<Cursor<S>> {
        let CursorBuilder {
            mut source,
            options,
            mode,
            error_listener,
        } = self;

        if !source.exists()? {
            if options.assert_if_missing {
                return Err(CursorError::SourceMissing {
                    name: source.name(),
                });
            }
            debug!(
                source = %source.name(),
                capacity = options.default_capacity,
                "source missing, provisioning"
            );
            source.provision(options.default_capacity)?;
        }

        let shared = Arc::new(Shared::new());
        let push = mode.is_push();
        let reader = ReaderLoop::new(
            source,
            shared.clone(),
            mode,
            error_listener,
            options.no_data_sleep(),
            options.error_sleep(),
        );

        Ok(Cursor {
            shared,
            push,
            thread_name: options.reader_thread_name,
            pending: Mutex::new(Some(reader)),
            reader: Mutex::new(None),
        })
    }
}

impl<S: Source> Cursor<S> {
    pub fn builder(source: S, options: CursorOptions) -> CursorBuilder<S> {
        CursorBuilder {
            source,
            options,
            mode: DeliveryMode::Pull,
            error_listener: None,
        }
    }

    /// Pull mode cursor without listeners.
    pub fn new(source: S, options: CursorOptions) -> Result<Self> {
        Self::builder(source, options).build()
    }

    /// Block until the next item arrives.
    ///
    /// Concurrent callers are served in the order they started waiting.
    ///
    /// # Errors
    /// - [`CursorError::InvalidMode`] when an item listener is bound.
    /// - [`CursorError::Cancelled`] when the cursor is stopped before or while
    ///   waiting.
    pub fn next(&self) -> Result<S::Item> {
        if self.push {
            return Err(CursorError::InvalidMode);
        }
        loop {
            self.shared
                .lock
                .acquire()
                .map_err(|_| CursorError::Cancelled)?;
            if let Some(item) = self.shared.slot.try_take() {
                return Ok(item);
            }
        }
    }

    /// Launch the reader thread.
    ///
    /// # Errors
    /// [`CursorError::AlreadyRunning`] unless the cursor is idle; a stopped
    /// cursor cannot be restarted.
    pub fn start(&self) -> Result<()> {
        self.shared
            .state
            .transition(RunState::Idle, RunState::Running)
            .map_err(|_| CursorError::AlreadyRunning)?;

        let reader = self
            .pending
            .lock()
            .take()
            .ok_or(CursorError::AlreadyRunning)?;

        let spawned = thread::Builder::new()
            .name(self.thread_name.clone())
            .spawn(move || reader.run());

        match spawned {
            Ok(handle) => {
                *self.reader.lock() = Some(handle);
                debug!(thread = %self.thread_name, "cursor started");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to spawn reader thread");
                self.halt();
                Err(e.into())
            }
        }
    }

    /// Stop the reader and cancel every blocked [`next`](Self::next) call.
    ///
    /// Does not wait for the reader thread; dropping the cursor does.
    ///
    /// # Errors
    /// [`CursorError::NotRunning`] unless the cursor is running.
    pub fn stop(&self) -> Result<()> {
        self.shared
            .state
            .transition(RunState::Running, RunState::Stopped)
            .map_err(|_| CursorError::NotRunning)?;
        self.halt();
        debug!(waiters = self.shared.lock.queued(), "cursor stopped");
        Ok(())
    }

    fn halt(&self) {
        self.shared.state.transition(RunState::Running, RunState::Stopped).ok();
        self.shared.shutdown.trigger();
        self.shared.slot.close();
        self.shared.lock.cancel();
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.is_running()
    }

    pub fn run_state(&self) -> RunState {
        self.shared.state.load()
    }

    /// Number of callers currently blocked in [`next`](Self::next).
    pub fn waiting_consumers(&self) -> usize {
        self.shared.lock.queued()
    }
}

impl<S: Source> Drop for Cursor<S> {
    fn drop(&mut self) {
        if self.is_running() {
            self.halt();
        }
        if let Some(handle) = self.reader.get_mut().take() {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                warn!("reader thread panicked");
            }
        }
    }
}
