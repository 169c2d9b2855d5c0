use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use tradewatch_core::{Connector, FeedError, Session};

/// Opens WebSocket sessions with tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Session>, FeedError> {
        let (stream, response) = connect_async(url)
            .await
            .map_err(|e| FeedError::Transport(format!("WebSocket connect failed: {}", e)))?;
        debug!(status = %response.status(), "WebSocket handshake complete");

        Ok(Box::new(WsSession {
            stream,
            closed: false,
        }))
    }
}

struct WsSession {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Set once the stream ended, errored, or was closed by us.
    closed: bool,
}

#[async_trait]
impl Session for WsSession {
    async fn send_text(&mut self, text: String) -> Result<(), FeedError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| FeedError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, FeedError>> {
        if self.closed {
            return None;
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text)),
                // Undecodable bytes are left for the JSON parser to reject.
                Some(Ok(Message::Binary(bytes))) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "Server closed the connection");
                    self.closed = true;
                    return None;
                }
                // Ping/pong are answered by tungstenite.
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    self.closed = true;
                    return Some(Err(FeedError::Transport(e.to_string())));
                }
                None => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "WebSocket close handshake failed");
        }
    }
}
