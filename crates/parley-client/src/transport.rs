//! Transport seam: message-oriented duplex connections behind object-safe
//! traits, with the WebSocket implementation used in production.

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use parley_common::TransportError;

/// One live duplex connection. Text frames in both directions; the
/// connection machine owns the handle and never exposes it.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: &str) -> Result<(), TransportError>;

    /// Next inbound frame. `None` means the peer closed cleanly.
    async fn next(&mut self) -> Option<Result<String, TransportError>>;

    async fn close(&mut self);
}

/// Opens transports. The seam the connection machine is tested through.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError>;
}

// ---------------------------------------------------------------------------
// WebSocket implementation
// ---------------------------------------------------------------------------

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production connector over `tokio-tungstenite`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

pub struct WsTransport {
    write: SplitSink<WsStream, WsMessage>,
    read: SplitStream<WsStream>,
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, TransportError> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        let (write, read) = ws_stream.split();
        Ok(Box::new(WsTransport { write, read }))
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, text: &str) -> Result<(), TransportError> {
        self.write
            .send(WsMessage::Text(text.to_string().into()))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn next(&mut self) -> Option<Result<String, TransportError>> {
        while let Some(result) = self.read.next().await {
            match result {
                Ok(WsMessage::Text(text)) => return Some(Ok(text.to_string())),
                Ok(WsMessage::Close(_)) => return None,
                Ok(other) => {
                    // Ping/pong are answered by tungstenite; binary is not
                    // part of the protocol.
                    debug!(kind = ?other, "Ignoring non-text frame");
                }
                Err(e) => return Some(Err(TransportError::WebSocket(e.to_string()))),
            }
        }
        None
    }

    async fn close(&mut self) {
        let _ = self.write.send(WsMessage::Close(None)).await;
    }
}
