//! WebSocket connection halves and frame mapping.

use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::trace;

use crate::error::ProtocolError;

/// Stream type of a client connection opened with [`crate::connect`].
pub type ClientStream = MaybeTlsStream<TcpStream>;

/// A data frame received from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// JSON control message.
    Text(String),
    /// Elementary stream chunk.
    Binary(Bytes),
}

/// Split a WebSocket into its sending and receiving halves.
pub fn split<S>(ws: WebSocketStream<S>) -> (FrameSender<S>, FrameReceiver<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (sink, stream) = ws.split();
    (FrameSender { sink }, FrameReceiver { stream })
}

/// Writes text frames to the socket.
pub struct FrameSender<S = ClientStream> {
    sink: SplitSink<WebSocketStream<S>, Message>,
}

impl<S> FrameSender<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Send one text frame.
    pub async fn send_text(&mut self, text: String) -> Result<(), ProtocolError> {
        let len = text.len();
        self.sink.send(Message::Text(text.into())).await?;
        trace!(len, "sent text frame");
        Ok(())
    }

    /// Send one binary frame.
    pub async fn send_binary(&mut self, data: Bytes) -> Result<(), ProtocolError> {
        let len = data.len();
        self.sink.send(Message::Binary(data)).await?;
        trace!(len, "sent binary frame");
        Ok(())
    }

    /// Close the socket gracefully.
    pub async fn close(&mut self) -> Result<(), ProtocolError> {
        self.sink.close().await?;
        Ok(())
    }
}

/// Reads data frames from the socket.
pub struct FrameReceiver<S = ClientStream> {
    stream: SplitStream<WebSocketStream<S>>,
}

impl<S> FrameReceiver<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Receive the next data frame.
    ///
    /// Control frames are skipped. Returns `None` once the peer closed the
    /// connection.
    pub async fn recv(&mut self) -> Result<Option<Frame>, ProtocolError> {
        while let Some(message) = self.stream.next().await {
            match message.map_err(|e| ProtocolError::Connection(e.to_string()))? {
                Message::Text(text) => {
                    trace!(len = text.as_str().len(), "received text frame");
                    return Ok(Some(Frame::Text(text.as_str().to_owned())));
                }
                Message::Binary(data) => {
                    trace!(len = data.len(), "received binary frame");
                    return Ok(Some(Frame::Binary(data)));
                }
                Message::Close(_) => return Ok(None),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }
}
