//! Minimal transport capability the connection state machine is written
//! against. The production implementation wraps a websocket stream; tests
//! substitute channel-backed fakes.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::GatewayError;

/// What the connection observes from its transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// One complete inbound text message.
    Message(String),
    /// The peer closed the connection. `code` is absent when the stream ended
    /// without a proper close frame.
    Closed { code: Option<u16>, reason: String },
}

#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: String) -> Result<(), GatewayError>;
    async fn close(&mut self, code: u16, reason: &str) -> Result<(), GatewayError>;
    async fn recv(&mut self) -> Option<TransportEvent>;
}

/// Opens transports; the supervisor holds one so reconnects can target
/// different endpoints with the same machinery.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, GatewayError>;
}

pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, GatewayError> {
        let (stream, _) = connect_async(url).await?;
        Ok(Box::new(WsTransport { inner: stream }))
    }
}

pub struct WsTransport {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, text: String) -> Result<(), GatewayError> {
        self.inner
            .send(Message::Text(text.into()))
            .await
            .map_err(GatewayError::from)
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), GatewayError> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        match self.inner.close(Some(frame)).await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(GatewayError::from(e)),
        }
    }

    async fn recv(&mut self) -> Option<TransportEvent> {
        while let Some(item) = self.inner.next().await {
            match item {
                Ok(Message::Text(text)) => {
                    return Some(TransportEvent::Message(text.to_string()))
                }
                Ok(Message::Close(frame)) => {
                    let (code, reason) = match frame {
                        Some(f) => (Some(u16::from(f.code)), f.reason.to_string()),
                        None => (None, String::new()),
                    };
                    return Some(TransportEvent::Closed { code, reason });
                }
                // pings and pongs are handled inside tungstenite; binary
                // frames are not part of this protocol
                Ok(_) => continue,
                Err(e) => {
                    return Some(TransportEvent::Closed {
                        code: None,
                        reason: e.to_string(),
                    })
                }
            }
        }
        None
    }
}
