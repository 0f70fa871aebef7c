#![allow(dead_code)]

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::{Arc, Once};
use std::thread;
use std::time::{Duration, Instant};
use tailer::{Shutdown, Source, SourceError};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .init();
    });
}

pub fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        thread::sleep(Duration::from_millis(1));
    }
}

/// One scripted response to `open`.
pub enum Step<T> {
    Items(Vec<T>),
    Fail(&'static str),
    /// Wait for new data until the cursor stops.
    Block,
}

/// A source that replays a fixed script of fetch results, then returns empty
/// batches forever. Records when each fetch happened.
pub struct ScriptedSource<T> {
    script: VecDeque<Step<T>>,
    opens: Arc<Mutex<Vec<Instant>>>,
}

impl<T> ScriptedSource<T> {
    pub fn new(script: Vec<Step<T>>) -> Self {
        ScriptedSource {
            script: script.into(),
            opens: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn opens(&self) -> Arc<Mutex<Vec<Instant>>> {
        self.opens.clone()
    }
}

impl<T: Send + 'static> Source for ScriptedSource<T> {
    type Item = T;
    type Batch = std::vec::IntoIter<Result<T, SourceError>>;

    fn open(&mut self, stop: &Shutdown) -> Result<Self::Batch, SourceError> {
        self.opens.lock().push(Instant::now());
        match self.script.pop_front() {
            Some(Step::Items(items)) => {
                let batch: Vec<_> = items.into_iter().map(Ok).collect();
                Ok(batch.into_iter())
            }
            Some(Step::Fail(message)) => Err(SourceError::Other(message.to_string())),
            Some(Step::Block) => {
                stop.sleep(Duration::from_secs(60));
                Ok(Vec::new().into_iter())
            }
            None => Ok(Vec::new().into_iter()),
        }
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}
