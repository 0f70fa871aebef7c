use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// One-shot stop signal that also cuts sleeps short.
///
/// The reader thread sleeps through [`Shutdown::sleep`] so that stopping the
/// cursor reaches it mid-sleep instead of after the full interval.
pub struct Shutdown {
    triggered: Mutex<bool>,
    signal: Condvar,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        Shutdown {
            triggered: Mutex::new(false),
            signal: Condvar::new(),
        }
    }

    pub fn trigger(&self) {
        let mut triggered = self.triggered.lock();
        *triggered = true;
        self.signal.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        *self.triggered.lock()
    }

    /// Sleep for `duration`. Returns `false` if the signal fired first.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut triggered = self.triggered.lock();
        while !*triggered {
            if self.signal.wait_until(&mut triggered, deadline).timed_out() {
                return !*triggered;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::sync::Arc;
    use std::thread;

    #[rstest]
    fn test_sleep_runs_full_duration() {
        let shutdown = Shutdown::new();
        let start = Instant::now();
        assert!(shutdown.sleep(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[rstest]
    fn test_trigger_interrupts_sleep() {
        let shutdown = Arc::new(Shutdown::new());
        let sleeper = {
            let shutdown = shutdown.clone();
            thread::spawn(move || {
                let start = Instant::now();
                let completed = shutdown.sleep(Duration::from_secs(30));
                (completed, start.elapsed())
            })
        };

        thread::sleep(Duration::from_millis(20));
        shutdown.trigger();

        let (completed, elapsed) = sleeper.join().unwrap();
        assert!(!completed);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[rstest]
    fn test_sleep_after_trigger_returns_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
        assert!(!shutdown.sleep(Duration::from_secs(30)));
    }
}
