use crate::models::SnapshotError;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while talking to the push-data endpoint.
///
/// None of these are fatal: the connection manager logs them and either
/// drops the offending message or reconnects.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Send failed: {0}")]
    Send(String),
    #[error("Malformed message: {0}")]
    Malformed(#[from] MalformedMessage),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FeedError {
    /// Whether the error concerns a single inbound message rather than the
    /// connection.
    pub fn is_malformed(&self) -> bool {
        matches!(self, FeedError::Malformed(_))
    }
}

/// Why an inbound payload was dropped.
#[derive(Debug, thiserror::Error)]
pub enum MalformedMessage {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("invalid snapshot: {0}")]
    Invalid(#[from] SnapshotError),
}

// ---------------------------------------------------------------------------
// Transport Traits
// ---------------------------------------------------------------------------

/// One open, message-based connection.
#[async_trait]
pub trait Session: Send {
    /// Send a text frame to the server.
    async fn send_text(&mut self, text: String) -> Result<(), FeedError>;

    /// Wait for the next inbound text payload.
    ///
    /// `Some(Err(_))` reports a transport error; `None` means the session
    /// has closed and will not yield again.
    async fn recv(&mut self) -> Option<Result<String, FeedError>>;

    /// Close the session. Safe to call more than once.
    async fn close(&mut self);
}

/// Opens sessions against a push-data endpoint.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> Result<Box<dyn Session>, FeedError>;
}
