use chrono::{DateTime, Local, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Time-of-day part of a `YYYY-MM-DD HH:MM:SS.sss` timestamp, cut to
/// `HH:MM:SS`. Anything that is not exactly `<date> <time>` comes back
/// unchanged.
pub fn format_time(timestamp: &str) -> String {
    if timestamp.is_empty() {
        return String::new();
    }

    let parts: Vec<&str> = timestamp.split(' ').collect();
    if parts.len() != 2 {
        return timestamp.to_string();
    }

    parts[1].chars().take(8).collect()
}

/// Two decimal places, half away from zero.
pub fn format_price(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded.to_string()
}

pub fn format_money(value: Decimal) -> String {
    format!("${}", format_price(value))
}

/// Quantities are shown as sent, without trailing zeros.
pub fn format_volume(value: Decimal) -> String {
    value.normalize().to_string()
}

pub fn format_updated_at(updated_at: DateTime<Utc>) -> String {
    format!(
        "Last update {}",
        updated_at.with_timezone(&Local).format("%H:%M:%S")
    )
}
