use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Status text shown before the first snapshot arrives.
pub const DEFAULT_STATUS: &str = "Connecting...";

// ---------------------------------------------------------------------------
// Direction & Status
// ---------------------------------------------------------------------------

/// Trade direction as reported by the backend.
///
/// Anything other than `BUY` or `SELL` is kept verbatim so it can still be
/// displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Direction {
    Buy,
    Sell,
    Other(String),
}

impl Direction {
    pub fn as_str(&self) -> &str {
        match self {
            Direction::Buy => "BUY",
            Direction::Sell => "SELL",
            Direction::Other(raw) => raw,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Direction::Buy)
    }
}

impl From<String> for Direction {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "BUY" => Direction::Buy,
            "SELL" => Direction::Sell,
            _ => Direction::Other(raw),
        }
    }
}

impl From<&str> for Direction {
    fn from(raw: &str) -> Self {
        Direction::from(raw.to_string())
    }
}

impl From<Direction> for String {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an open position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PositionStatus {
    Active,
    Opening,
    Other(String),
}

impl PositionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            PositionStatus::Active => "Active",
            PositionStatus::Opening => "Opening",
            PositionStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for PositionStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Active" => PositionStatus::Active,
            "Opening" => PositionStatus::Opening,
            _ => PositionStatus::Other(raw),
        }
    }
}

impl From<&str> for PositionStatus {
    fn from(raw: &str) -> Self {
        PositionStatus::from(raw.to_string())
    }
}

impl From<PositionStatus> for String {
    fn from(status: PositionStatus) -> Self {
        match status {
            PositionStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A trade that is currently open at the broker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub symbol: String,
    pub direction: Direction,
    pub status: PositionStatus,
    pub volume: Decimal,
    pub price: Decimal,
    /// Broker-assigned deal identifier.
    pub deal_id: String,
    /// `YYYY-MM-DD HH:MM:SS.sss`, kept as sent.
    pub timestamp: String,
    /// Whether the deal was replicated to the MT5 terminal.
    #[serde(default)]
    pub mt5_mirrored: bool,
}

/// A settled trade kept for history display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedPosition {
    pub symbol: String,
    pub direction: Direction,
    pub volume: Decimal,
    pub price: Decimal,
    pub deal_id: String,
    pub open_timestamp: String,
    pub close_timestamp: String,
    #[serde(default)]
    pub mt5_mirrored: bool,
}

// ---------------------------------------------------------------------------
// Account & Snapshot
// ---------------------------------------------------------------------------

/// Connection state and balance of the secondary (MT5) venue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountStatus {
    pub connected: bool,
    pub balance: Decimal,
}

/// The complete trading state as of the last accepted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Free-text session status from the backend.
    pub status: String,
    #[serde(rename = "mt5_status", default)]
    pub account_status: AccountStatus,
    #[serde(default)]
    pub open_positions: Vec<OpenPosition>,
    #[serde(default)]
    pub closed_positions: Vec<ClosedPosition>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            status: DEFAULT_STATUS.to_string(),
            account_status: AccountStatus::default(),
            open_positions: Vec::new(),
            closed_positions: Vec::new(),
        }
    }
}

/// Reasons a decoded snapshot is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("Duplicate deal id {0} in {1} positions")]
    DuplicateDealId(String, &'static str),
    #[error("Negative {field} on deal {deal_id}")]
    NegativeValue {
        deal_id: String,
        field: &'static str,
    },
    #[error("Negative account balance")]
    NegativeBalance,
}

impl Snapshot {
    /// Check the invariants a snapshot must hold before it may replace the
    /// current one.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.account_status.balance < Decimal::ZERO {
            return Err(SnapshotError::NegativeBalance);
        }

        check_positions(
            "open",
            self.open_positions
                .iter()
                .map(|p| (p.deal_id.as_str(), p.volume, p.price)),
        )?;
        check_positions(
            "closed",
            self.closed_positions
                .iter()
                .map(|p| (p.deal_id.as_str(), p.volume, p.price)),
        )?;

        Ok(())
    }
}

fn check_positions<'a>(
    list: &'static str,
    positions: impl Iterator<Item = (&'a str, Decimal, Decimal)>,
) -> Result<(), SnapshotError> {
    let mut seen = HashSet::new();
    for (deal_id, volume, price) in positions {
        if !seen.insert(deal_id) {
            return Err(SnapshotError::DuplicateDealId(deal_id.to_string(), list));
        }
        for (field, value) in [("volume", volume), ("price", price)] {
            if value < Decimal::ZERO {
                return Err(SnapshotError::NegativeValue {
                    deal_id: deal_id.to_string(),
                    field,
                });
            }
        }
    }
    Ok(())
}
