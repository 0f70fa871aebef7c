use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffError {
    #[error("operation cancelled while waiting")]
    Cancelled,

    #[error("handoff slot is closed")]
    Closed,
}
