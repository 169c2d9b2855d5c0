use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tradewatch_core::{ClosedPosition, FeedError, MalformedMessage, Snapshot};

/// Messages sent from the client TO the trade monitor server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command")]
pub enum OutboundMessage {
    /// Ask the server to push the current snapshot.
    #[serde(rename = "get_data")]
    GetData,
}

impl OutboundMessage {
    pub fn encode(&self) -> Result<String, FeedError> {
        serde_json::to_string(self)
            .map_err(|e| FeedError::Send(format!("Serialization error: {}", e)))
    }
}

/// The part of each inbound payload a feed reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Status, account status, open and closed positions.
    #[default]
    Full,
    /// Only `status` and `closed_positions`; every other field is ignored.
    History,
}

impl Projection {
    pub fn decode(&self, payload: &str) -> Result<Snapshot, FeedError> {
        match self {
            Projection::Full => decode_snapshot(payload),
            Projection::History => decode_history(payload),
        }
    }
}

/// Decode an inbound payload into a snapshot.
///
/// The payload must be a JSON object with a string `status`; everything else
/// falls back to its default when absent. A decoded snapshot that breaks a
/// data invariant is refused as a whole.
pub fn decode_snapshot(payload: &str) -> Result<Snapshot, FeedError> {
    let snapshot: Snapshot = decode_object(payload)?;
    snapshot.validate().map_err(MalformedMessage::from)?;
    Ok(snapshot)
}

#[derive(Deserialize)]
struct HistoryPayload {
    status: String,
    #[serde(default)]
    closed_positions: Vec<ClosedPosition>,
}

/// Decode only the fields the history view reads. The rest of the snapshot
/// stays at its defaults.
pub fn decode_history(payload: &str) -> Result<Snapshot, FeedError> {
    let HistoryPayload {
        status,
        closed_positions,
    } = decode_object(payload)?;

    let snapshot = Snapshot {
        status,
        closed_positions,
        ..Default::default()
    };
    snapshot.validate().map_err(MalformedMessage::from)?;
    Ok(snapshot)
}

/// Serde's derived struct visitors also accept JSON arrays, so the object
/// shape is checked before the typed decode.
fn decode_object<T: DeserializeOwned>(payload: &str) -> Result<T, MalformedMessage> {
    let value: Value = serde_json::from_str(payload)?;
    if !value.is_object() {
        return Err(MalformedMessage::NotAnObject);
    }
    Ok(serde_json::from_value(value)?)
}
