use tradewatch_feed::{spawn_feed, FeedConfig, FeedHandle, Projection};
use tradewatch_render::{Panel, ThemeSignal, ViewInput, ViewKind};

/// A mounted view: the projection it draws, its own feed, and the shared
/// theme.
pub struct App {
    pub kind: ViewKind,
    pub feed: FeedHandle,
    pub theme: ThemeSignal,
}

impl App {
    pub fn mount(kind: ViewKind, feed: FeedConfig, theme: ThemeSignal) -> Self {
        tracing::info!(view = %kind, url = %feed.url, "Mounting view");
        Self {
            kind,
            feed: spawn_feed(feed, projection(kind)),
            theme,
        }
    }

    /// Derive the current frame from the latest snapshot.
    pub fn panel(&self) -> Panel {
        let frame = self.feed.store().frame();
        self.kind.render(&ViewInput {
            connection: self.feed.connection_state(),
            snapshot: &frame.snapshot,
            updated_at: frame.updated_at,
            theme: self.theme.current(),
        })
    }

    /// Release the feed: close the connection and cancel any pending retry.
    pub async fn unmount(self) {
        tracing::info!(view = %self.kind, "Unmounting view");
        self.feed.shutdown().await;
    }
}

/// The payload fields each view reads.
fn projection(kind: ViewKind) -> Projection {
    match kind {
        ViewKind::Monitor => Projection::Full,
        ViewKind::History => Projection::History,
    }
}
