//! WebSocket transport layer and wire protocol for glasspane.
//!
//! This crate handles the host connection (via tokio-tungstenite), JSON
//! encoding of outbound messages, forward-compatible decoding of inbound
//! control messages, and the [`MessageSink`] seam the input pipeline sends
//! through.

pub mod connection;
pub mod error;
pub mod sink;
pub mod transport;
pub mod wire;

pub use connection::{split, Frame, FrameReceiver, FrameSender};
pub use error::ProtocolError;
#[cfg(any(test, feature = "mock"))]
pub use sink::RecordingSink;
pub use sink::{ChannelSink, MessageSink};
pub use transport::{connect, socket_url};
pub use wire::{decode_inbound, encode_message};
