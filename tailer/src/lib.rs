//! # tailer - blocking pull cursor over a live source
//!
//! A [`Cursor`] runs a background reader thread that keeps pulling from a
//! [`Source`] and hands every item to exactly one caller of [`Cursor::next`],
//! in the order the source produced them. Empty fetches are followed by a
//! short idle sleep and failures by a backoff sleep, so an unreliable source
//! turns into a steady stream until [`Cursor::stop`] is called.
//!
//! ## Pull mode
//!
//! ```rust
//! use tailer::{Cursor, CursorOptions, MemoryLog};
//!
//! let log = MemoryLog::new();
//! log.extend(["a", "b", "c"]);
//!
//! let cursor = Cursor::new(log.source(), CursorOptions::default())?;
//! cursor.start()?;
//! assert_eq!(cursor.next()?, "a");
//! assert_eq!(cursor.next()?, "b");
//! assert_eq!(cursor.next()?, "c");
//! cursor.stop()?;
//! # Ok::<(), tailer::CursorError>(())
//! ```
//!
//! Any number of threads may call [`Cursor::next`] on a shared cursor; the one
//! that has waited longest receives the next item. Stopping the cursor makes
//! every blocked call return [`CursorError::Cancelled`].
//!
//! ## Push mode
//!
//! Binding an item listener delivers items on the reader thread instead.
//! [`Cursor::next`] then fails with [`CursorError::InvalidMode`].
//!
//! ```rust
//! use std::sync::mpsc;
//! use tailer::{Cursor, CursorOptions, ListenerError, MemoryLog};
//!
//! let log = MemoryLog::new();
//! log.append(42);
//!
//! let (tx, rx) = mpsc::channel();
//! let cursor = Cursor::builder(log.source(), CursorOptions::default())
//!     .item_listener(move |item: i32| -> Result<(), ListenerError> {
//!         tx.send(item).ok();
//!         Ok(())
//!     })
//!     .build()?;
//! cursor.start()?;
//! assert_eq!(rx.recv().unwrap(), 42);
//! # Ok::<(), tailer::CursorError>(())
//! ```

use thiserror::Error;

pub mod cursor;
pub mod listener;
pub mod options;
pub(crate) mod reader;
pub mod shutdown;
pub mod source;
pub mod state;

pub use cursor::{Cursor, CursorBuilder};
pub use listener::{DeliveryMode, ErrorListener, ItemListener, ListenerError};
pub use options::CursorOptions;
pub use shutdown::Shutdown;
pub use source::{FileSource, MemoryLog, MemorySource, Source, SourceError};
pub use state::RunState;

#[derive(Error, Debug)]
pub enum CursorError {
    #[error("cursor already started")]
    AlreadyRunning,
    #[error("cursor is not running")]
    NotRunning,
    #[error("next() cannot be used while an item listener is bound")]
    InvalidMode,
    #[error("cursor stopped while waiting")]
    Cancelled,
    #[error("source {name} does not exist")]
    SourceMissing { name: String },
    #[error("Source error: {0}")]
    Source(#[from] SourceError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CursorError>;
