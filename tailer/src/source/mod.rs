use thiserror::Error;

use crate::listener::ListenerError;
use crate::shutdown::Shutdown;

pub mod file;
pub mod memory;

pub use file::FileSource;
pub use memory::{MemoryLog, MemorySource};

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source {name} not found")]
    Missing { name: String },
    #[error("source closed")]
    Closed,
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("{0}")]
    Other(String),
}

/// A live, possibly unreliable provider of an ordered stream of items.
///
/// The reader thread owns the source exclusively and calls [`Source::open`]
/// over and over. Each call is one fetch attempt returning a lazy batch of the
/// items that became available since the last one. An empty batch means
/// nothing new yet; the batch may also fail part way through.
///
/// The source keeps track of its own position: after a batch is dropped,
/// whether exhausted or abandoned after an error, the next `open` continues
/// after the last item that batch yielded. Dropping the batch releases
/// whatever the fetch held open.
///
/// The reader notices a stop between fetches and between items. A source that
/// waits for data inside `open` must wait on `stop` ([`Shutdown::sleep`] or
/// [`Shutdown::is_triggered`]) and return once it fires; what it returns then
/// is discarded.
pub trait Source: Send + 'static {
    type Item: Send + 'static;
    type Batch: Iterator<Item = Result<Self::Item, SourceError>>;

    fn open(&mut self, stop: &Shutdown) -> Result<Self::Batch, SourceError>;

    /// Human readable locator used in logs and errors.
    fn name(&self) -> String;

    /// Whether the backing store is present. Sources that cannot be absent
    /// keep the default.
    fn exists(&self) -> Result<bool, SourceError> {
        Ok(true)
    }

    /// Create the backing store. `capacity_bytes` is a sizing hint.
    fn provision(&mut self, capacity_bytes: u64) -> Result<(), SourceError> {
        let _ = capacity_bytes;
        Ok(())
    }
}
