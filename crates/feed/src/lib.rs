//! Client side of the trade monitor push feed.
//!
//! A [`ConnectionManager`] owns one connection to the backend, keeps it alive
//! with a fixed-delay reconnect, and writes every accepted snapshot into a
//! [`SnapshotStore`]. Spawning the manager yields a [`FeedHandle`] that tears
//! everything down when shut down or dropped.

pub mod config;
pub mod connection;
pub mod protocol;
pub mod store;
pub mod ws;

pub use config::FeedConfig;
pub use connection::{ConnectionManager, FeedHandle};
pub use protocol::Projection;
pub use store::{SnapshotFrame, SnapshotStore};
pub use ws::WsConnector;

use std::sync::Arc;

/// Mount a feed against the configured WebSocket endpoint.
pub fn spawn_feed(config: FeedConfig, projection: Projection) -> FeedHandle {
    ConnectionManager::new(config, Arc::new(WsConnector))
        .with_projection(projection)
        .spawn()
}
