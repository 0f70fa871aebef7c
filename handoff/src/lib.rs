//! # handoff - FIFO admission lock and capacity-one handoff slot
//!
//! Two blocking primitives for passing items from a single producer thread to
//! any number of consumer threads, one item at a time, in arrival order.
//!
//! - [`FairLock`] queues blocked threads by ticket and admits them strictly in
//!   the order they arrived. Blocking uses condition variables, never spinning.
//! - [`HandoffSlot`] holds at most one item. The producer blocks while it is
//!   occupied, which gives backpressure instead of an unbounded buffer.
//!
//! ## Pairing the two
//!
//! The producer puts an item and then releases a lock created with
//! [`FairLock::locked`]. Each release admits exactly one consumer, the one that
//! has waited longest, and the admitted consumer takes the item.
//!
//! ```rust
//! use handoff::{FairLock, HandoffSlot};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let lock = Arc::new(FairLock::locked());
//! let slot = Arc::new(HandoffSlot::new());
//!
//! let consumer = {
//!     let (lock, slot) = (lock.clone(), slot.clone());
//!     thread::spawn(move || {
//!         lock.acquire()?;
//!         Ok::<_, handoff::HandoffError>(slot.try_take())
//!     })
//! };
//!
//! slot.put("hello")?;
//! lock.release();
//!
//! assert_eq!(consumer.join().unwrap()?, Some("hello"));
//! # Ok::<(), handoff::HandoffError>(())
//! ```
//!
//! ## Cancellation
//!
//! [`FairLock::cancel`] fails every queued and future acquire with
//! [`HandoffError::Cancelled`]; [`HandoffSlot::close`] fails a blocked and
//! every future put with [`HandoffError::Closed`].
//!
//! Building with the `loom` feature swaps the `parking_lot` primitives for
//! `loom::sync` ones so the model checks in this crate can run.

pub use error::HandoffError;
pub use fair_lock::FairLock;
pub use slot::HandoffSlot;

pub mod error;
pub mod fair_lock;
#[cfg(all(test, feature = "loom"))]
pub(crate) mod loom;
pub mod slot;
pub(crate) mod sync;
