//! WebSocket transport: connect to the host.

use tokio_tungstenite::connect_async;
use tracing::{debug, info};

use crate::connection::{split, FrameReceiver, FrameSender};
use crate::error::ProtocolError;

/// Open a WebSocket connection to the host.
///
/// `ws://` and `wss://` URLs are both accepted; TLS uses the native root
/// store.
pub async fn connect(url: &str) -> Result<(FrameSender, FrameReceiver), ProtocolError> {
    debug!(url, "connecting");
    let (ws, response) = connect_async(url)
        .await
        .map_err(|e| ProtocolError::Connection(e.to_string()))?;
    info!(url, status = %response.status(), "connected to host");
    Ok(split(ws))
}

/// Build the socket URL the host's web page would use.
///
/// `secure` mirrors whether the page itself was served over https.
pub fn socket_url(host: &str, port: u16, secure: bool) -> String {
    let scheme = if secure { "wss" } else { "ws" };
    format!("{scheme}://{host}:{port}")
}
