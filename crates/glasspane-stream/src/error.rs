//! Stream subsystem errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to create decoder session: {0}")]
    SessionCreate(String),

    #[error("failed to attach append buffer: {0}")]
    Attach(String),

    #[error("append rejected: {0}")]
    Append(String),

    #[error("remove rejected: {0}")]
    Remove(String),

    #[error("buffer is busy")]
    Busy,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
