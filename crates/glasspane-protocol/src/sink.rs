//! Outbound message sinks.
//!
//! The input and session layers never touch the socket directly; they hand
//! text frames to a [`MessageSink`]. Sends are fire-and-forget and keep the
//! order in which they were made.

use glasspane_types::OutboundMessage;
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::ProtocolError;
use crate::wire::encode_message;

/// Destination for outbound text frames.
pub trait MessageSink: Send {
    /// Queue a raw text frame.
    fn send_text(&mut self, text: String) -> Result<(), ProtocolError>;

    /// Encode and queue a wire message.
    fn send(&mut self, msg: &OutboundMessage) -> Result<(), ProtocolError> {
        let text = encode_message(msg)?;
        trace!(kind = msg.kind(), len = text.len(), "queued message");
        self.send_text(text)
    }
}

/// Sink backed by an unbounded channel drained by the socket writer task.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// Create a sink and the receiver the writer task drains.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl MessageSink for ChannelSink {
    fn send_text(&mut self, text: String) -> Result<(), ProtocolError> {
        self.tx.send(text).map_err(|_| ProtocolError::StreamClosed)
    }
}

/// Sink that records every frame, for tests.
#[cfg(any(test, feature = "mock"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    sent: std::sync::Arc<std::sync::Mutex<Vec<String>>>,
}

#[cfg(any(test, feature = "mock"))]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every text frame sent so far, in order.
    pub fn frames(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Every frame parsed as JSON. Non-JSON frames (the access code) are skipped.
    pub fn json(&self) -> Vec<serde_json::Value> {
        self.frames()
            .iter()
            .filter_map(|f| serde_json::from_str(f).ok())
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[cfg(any(test, feature = "mock"))]
impl MessageSink for RecordingSink {
    fn send_text(&mut self, text: String) -> Result<(), ProtocolError> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }
}
