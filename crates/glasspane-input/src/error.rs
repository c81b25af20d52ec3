//! Input subsystem errors.

use glasspane_protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to send input message: {0}")]
    Send(#[from] ProtocolError),

    #[error("invalid recorded event: {0}")]
    InvalidEvent(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
