//! Client errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not connected")]
    NotConnected,

    #[error("protocol error: {0}")]
    Protocol(#[from] glasspane_protocol::ProtocolError),

    #[error("input error: {0}")]
    Input(#[from] glasspane_input::InputError),

    #[error("stream error: {0}")]
    Stream(#[from] glasspane_stream::StreamError),

    #[error("failed to encode virtual key profiles: {0}")]
    Profiles(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
