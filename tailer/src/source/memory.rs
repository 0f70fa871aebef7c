use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use super::{Source, SourceError};
use crate::shutdown::Shutdown;

type Filter<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

struct LogInner<T> {
    items: Vec<T>,
    closed: bool,
    provisioned: bool,
    capacity: Option<u64>,
}

/// An in-process append-only log.
///
/// Cloning yields another handle to the same log. Readers created with
/// [`MemoryLog::source`] see every item appended after their position,
/// including items appended while a batch is being drained.
pub struct MemoryLog<T> {
    name: Arc<str>,
    inner: Arc<Mutex<LogInner<T>>>,
}

impl<T> Clone for MemoryLog<T> {
    fn clone(&self) -> Self {
        MemoryLog {
            name: self.name.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> Default for MemoryLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + 'static> MemoryLog<T> {
    pub fn new() -> Self {
        Self::with_state("memory", true)
    }

    /// A log that reports itself absent until a source provisions it.
    pub fn unprovisioned(name: &str) -> Self {
        Self::with_state(name, false)
    }

    fn with_state(name: &str, provisioned: bool) -> Self {
        MemoryLog {
            name: name.into(),
            inner: Arc::new(Mutex::new(LogInner {
                items: Vec::new(),
                closed: false,
                provisioned,
                capacity: None,
            })),
        }
    }

    pub fn append(&self, item: T) {
        self.inner.lock().items.push(item);
    }

    pub fn extend(&self, items: impl IntoIterator<Item = T>) {
        self.inner.lock().items.extend(items);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every later fetch fail with [`SourceError::Closed`].
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }

    pub fn is_provisioned(&self) -> bool {
        self.inner.lock().provisioned
    }

    /// Capacity hint recorded when the log was provisioned by a source.
    pub fn capacity(&self) -> Option<u64> {
        self.inner.lock().capacity
    }

    /// A reader starting at the beginning of the log.
    pub fn source(&self) -> MemorySource<T> {
        MemorySource {
            log: self.clone(),
            position: Arc::new(AtomicUsize::new(0)),
            filter: None,
        }
    }

    /// A reader that only yields items accepted by `filter`.
    pub fn source_with_filter<F>(&self, filter: F) -> MemorySource<T>
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        MemorySource {
            log: self.clone(),
            position: Arc::new(AtomicUsize::new(0)),
            filter: Some(Arc::new(filter)),
        }
    }
}

pub struct MemorySource<T> {
    log: MemoryLog<T>,
    position: Arc<AtomicUsize>,
    filter: Option<Filter<T>>,
}

impl<T> MemorySource<T> {
    /// Index of the next item this reader will examine.
    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }
}

impl<T: Clone + Send + 'static> Source for MemorySource<T> {
    type Item = T;
    type Batch = MemoryBatch<T>;

    fn open(&mut self, _stop: &Shutdown) -> Result<Self::Batch, SourceError> {
        let inner = self.log.inner.lock();
        if inner.closed {
            return Err(SourceError::Closed);
        }
        if !inner.provisioned {
            return Err(SourceError::Missing {
                name: self.log.name.to_string(),
            });
        }
        Ok(MemoryBatch {
            log: self.log.inner.clone(),
            position: self.position.clone(),
            filter: self.filter.clone(),
        })
    }

    fn name(&self) -> String {
        self.log.name.to_string()
    }

    fn exists(&self) -> Result<bool, SourceError> {
        Ok(self.log.is_provisioned())
    }

    fn provision(&mut self, capacity_bytes: u64) -> Result<(), SourceError> {
        let mut inner = self.log.inner.lock();
        inner.provisioned = true;
        inner.capacity = Some(capacity_bytes);
        debug!(name = %self.log.name, capacity_bytes, "provisioned memory log");
        Ok(())
    }
}

/// Items appended after the reader's position, read lazily.
pub struct MemoryBatch<T> {
    log: Arc<Mutex<LogInner<T>>>,
    position: Arc<AtomicUsize>,
    filter: Option<Filter<T>>,
}

impl<T: Clone> Iterator for MemoryBatch<T> {
    type Item = Result<T, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let item = {
                let inner = self.log.lock();
                let position = self.position.load(Ordering::Acquire);
                let item = inner.items.get(position)?.clone();
                self.position.store(position + 1, Ordering::Release);
                item
            };
            match &self.filter {
                Some(filter) if !filter(&item) => continue,
                _ => return Some(Ok(item)),
            }
        }
    }
}
