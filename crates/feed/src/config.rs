use serde::{Deserialize, Serialize};
use std::time::Duration;
use tradewatch_core::FeedError;

pub const DEFAULT_URL: &str = "ws://localhost:8765";
pub const DEFAULT_RECONNECT_DELAY_SECS: u64 = 3;

/// Configuration for connecting to the trade monitor server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// WebSocket endpoint (e.g. "ws://localhost:8765").
    pub url: String,
    /// Fixed delay between a disconnect and the next connection attempt.
    pub reconnect_delay_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            reconnect_delay_secs: DEFAULT_RECONNECT_DELAY_SECS,
        }
    }
}

impl FeedConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn validate(&self) -> Result<(), FeedError> {
        if !(self.url.starts_with("ws://") || self.url.starts_with("wss://")) {
            return Err(FeedError::InvalidConfig(format!(
                "url must use ws:// or wss://, got {}",
                self.url
            )));
        }
        if self.reconnect_delay_secs == 0 {
            return Err(FeedError::InvalidConfig(
                "reconnect_delay_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
