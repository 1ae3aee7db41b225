//! Transport seam between the command channel and the wire.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Close,
}

/// An established, bidirectional connection to a command source.
#[async_trait]
pub trait Transport: Send {
    /// Next inbound frame; `None` once the peer is gone.
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>>;
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;
    async fn close(&mut self);
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, endpoint: &Url) -> Result<Box<dyn Transport>, TransportError>;
}

/// Opens WebSocket connections with `tokio-tungstenite`.
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self, endpoint: &Url) -> Result<Box<dyn Transport>, TransportError> {
        let (stream, _) =
            connect_async(endpoint.as_str())
                .await
                .map_err(|source| TransportError::Connect {
                    endpoint: endpoint.to_string(),
                    source: Box::new(source),
                })?;
        Ok(Box::new(WsTransport { stream }))
    }
}

struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            let msg = match self.stream.next().await? {
                Ok(msg) => msg,
                Err(err) => return Some(Err(TransportError::Receive(Box::new(err)))),
            };
            match msg {
                Message::Text(text) => return Some(Ok(Frame::Text(text))),
                Message::Binary(bytes) => return Some(Ok(Frame::Binary(bytes))),
                Message::Close(_) => return Some(Ok(Frame::Close)),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|err| TransportError::Send(Box::new(err)))
    }

    async fn close(&mut self) {
        if let Err(err) = self.stream.close(None).await {
            debug!(%err, "command channel: close handshake did not complete");
        }
    }
}
