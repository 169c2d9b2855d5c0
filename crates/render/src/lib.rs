//! Pure projections of a trade monitor snapshot into display panels.
//!
//! The monitor and history views share one [`ViewKind`] entry point so the
//! frontends only pick which projection to draw.

pub mod format;
pub mod history;
pub mod monitor;
pub mod panel;
pub mod text;
pub mod theme;
pub mod tone;

pub use panel::*;
pub use theme::{Theme, ThemeSignal};
pub use tone::Tone;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tradewatch_core::{ConnectionState, Snapshot};

/// Everything a view needs to draw one frame.
#[derive(Debug, Clone, Copy)]
pub struct ViewInput<'a> {
    pub connection: ConnectionState,
    pub snapshot: &'a Snapshot,
    pub updated_at: Option<DateTime<Utc>>,
    pub theme: Theme,
}

/// Which projection of the snapshot is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Monitor,
    History,
}

impl ViewKind {
    pub fn render(&self, input: &ViewInput<'_>) -> Panel {
        match self {
            ViewKind::Monitor => monitor::render(input),
            ViewKind::History => history::render(input),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ViewKind::Monitor => "Trade Monitor",
            ViewKind::History => "Trade History",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
