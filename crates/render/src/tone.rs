use serde::{Deserialize, Serialize};
use tradewatch_core::{Direction, PositionStatus};

use crate::panel::Cell;

/// Semantic color of a rendered element. Backends map it to actual colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Affirmative,
    Negative,
    Caution,
    Info,
    #[default]
    Neutral,
}

/// BUY is affirmative; every other direction is treated as a sell.
pub fn direction_tone(direction: &Direction) -> Tone {
    if direction.is_buy() {
        Tone::Affirmative
    } else {
        Tone::Negative
    }
}

pub fn status_tone(status: &PositionStatus) -> Tone {
    match status {
        PositionStatus::Active => Tone::Affirmative,
        PositionStatus::Opening => Tone::Caution,
        PositionStatus::Other(_) => Tone::Info,
    }
}

pub fn mirrored_badge(mirrored: bool) -> Cell {
    if mirrored {
        Cell::toned("Mirrored", Tone::Affirmative)
    } else {
        Cell::toned("Not Mirrored", Tone::Caution)
    }
}
