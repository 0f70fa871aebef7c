use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::source::SourceError;

#[derive(Error, Debug)]
#[error("item listener failed: {0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl fmt::Display) -> Self {
        ListenerError(message.to_string())
    }
}

/// Receives items on the reader thread (push mode).
///
/// A slow listener throttles the whole cursor. A failure is reported like a
/// source failure and followed by the error backoff; the item is not
/// redelivered.
pub trait ItemListener<T>: Send + Sync {
    fn on_item(&self, item: T) -> Result<(), ListenerError>;
}

impl<T, F> ItemListener<T> for F
where
    F: Fn(T) -> Result<(), ListenerError> + Send + Sync,
{
    fn on_item(&self, item: T) -> Result<(), ListenerError> {
        self(item)
    }
}

/// Receives every failure the reader recovers from.
pub trait ErrorListener: Send + Sync {
    fn on_error(&self, error: &SourceError);
}

impl<F> ErrorListener for F
where
    F: Fn(&SourceError) + Send + Sync,
{
    fn on_error(&self, error: &SourceError) {
        self(error)
    }
}

/// How the reader hands items over, fixed when the cursor is built.
pub enum DeliveryMode<T> {
    /// Items wait in the handoff slot for a caller of `Cursor::next`.
    Pull,
    /// Items are passed to the listener on the reader thread.
    Push(Arc<dyn ItemListener<T>>),
}

impl<T> DeliveryMode<T> {
    pub fn is_push(&self) -> bool {
        matches!(self, DeliveryMode::Push(_))
    }
}

impl<T> Clone for DeliveryMode<T> {
    fn clone(&self) -> Self {
        match self {
            DeliveryMode::Pull => DeliveryMode::Pull,
            DeliveryMode::Push(listener) => DeliveryMode::Push(listener.clone()),
        }
    }
}

impl<T> fmt::Debug for DeliveryMode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Pull => f.write_str("Pull"),
            DeliveryMode::Push(_) => f.write_str("Push(..)"),
        }
    }
}
