//! Wire format: JSON text frames.
//!
//! Outbound messages are always JSON. Inbound text is JSON too, but the
//! host may grow new message kinds, so anything that parses as JSON but not
//! as a known [`InboundMessage`] decodes to `None` instead of an error.

use glasspane_types::{InboundMessage, OutboundMessage};
use tracing::debug;

use crate::error::ProtocolError;

/// Encode a message as a JSON text frame.
pub fn encode_message(msg: &OutboundMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Serialization(e.to_string()))
}

/// Decode an inbound text frame.
///
/// Returns `Ok(None)` for well-formed JSON of an unknown shape.
pub fn decode_inbound(text: &str) -> Result<Option<InboundMessage>, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::Deserialization(e.to_string()))?;

    match serde_json::from_value::<InboundMessage>(value) {
        Ok(msg) => Ok(Some(msg)),
        Err(e) => {
            debug!(error = %e, "ignoring unrecognised message");
            Ok(None)
        }
    }
}
