//! WebSocket client for the change notification stream.

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use url::Url;

use super::ClientError;
use crate::objects::WsServerMessage;

/// A live subscription to `GET /api/v1/ws`.
pub struct NotificationStream {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl NotificationStream {
    /// Connect to the notification stream of the server at `base_url`.
    ///
    /// `http`/`https` schemes are rewritten to `ws`/`wss`.
    pub async fn connect(base_url: &Url) -> Result<Self, ClientError> {
        let mut url = base_url.join("/api/v1/ws")?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        // Only fails for cannot-be-a-base URLs, which `join` already rejected.
        let _ = url.set_scheme(scheme);

        let (socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;
        Ok(Self { socket })
    }

    /// Wait for the next notification.
    ///
    /// Returns `Ok(None)` once the server closes the connection. Ping, pong
    /// and binary frames are skipped.
    pub async fn next(&mut self) -> Result<Option<WsServerMessage>, ClientError> {
        while let Some(frame) = self.socket.next().await {
            match frame? {
                Message::Text(text) => {
                    let message: WsServerMessage = serde_json::from_str(text.as_str())?;
                    return Ok(Some(message));
                }
                Message::Close(_) => return Ok(None),
                _ => continue,
            }
        }
        Ok(None)
    }
}
