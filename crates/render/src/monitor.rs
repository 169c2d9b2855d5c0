use tradewatch_core::{ConnectionState, OpenPosition, Snapshot};

use crate::format::{format_money, format_price, format_time, format_updated_at, format_volume};
use crate::panel::*;
use crate::tone::{mirrored_badge, status_tone, Tone};
use crate::ViewInput;

const HEADERS: [&str; 8] = [
    "Symbol",
    "Direction",
    "Volume",
    "Price",
    "Status",
    "Deal ID",
    "Time",
    "MT5",
];

/// Full monitor view: connection card, summary metrics, open positions.
pub fn render(input: &ViewInput<'_>) -> Panel {
    let snapshot = input.snapshot;

    Panel {
        title: "Trade Monitor",
        theme: input.theme,
        connection: input.connection,
        status: Some(status_card(input.connection, snapshot)),
        summary: summary(snapshot),
        section: Section {
            title: "Active Positions",
            body: open_positions(&snapshot.open_positions),
        },
        footer: input.updated_at.map(format_updated_at),
    }
}

fn status_card(connection: ConnectionState, snapshot: &Snapshot) -> StatusCard {
    let connection = match connection {
        ConnectionState::Connected => Cell::toned("Connected to Monitor", Tone::Affirmative),
        ConnectionState::Connecting => Cell::toned("Connecting...", Tone::Neutral),
        ConnectionState::Disconnected => Cell::toned("Disconnected", Tone::Neutral),
    }
    .strong();

    let account = &snapshot.account_status;
    let (venue, balance) = if account.connected {
        (
            Cell::toned("MT5: Connected", Tone::Affirmative),
            Some(Cell::toned(format_money(account.balance), Tone::Affirmative)),
        )
    } else {
        (Cell::toned("MT5: Disconnected", Tone::Negative), None)
    };

    StatusCard {
        connection,
        venue,
        balance,
        session_status: snapshot.status.clone(),
    }
}

fn summary(snapshot: &Snapshot) -> Vec<Metric> {
    let account = &snapshot.account_status;
    let balance = if account.connected {
        format_money(account.balance)
    } else {
        "$0.00".to_string()
    };

    vec![
        Metric {
            label: "Open Positions",
            value: snapshot.open_positions.len().to_string(),
        },
        Metric {
            label: "Recent Trades",
            value: snapshot.closed_positions.len().to_string(),
        },
        Metric {
            label: "MT5 Balance",
            value: balance,
        },
    ]
}

fn open_positions(positions: &[OpenPosition]) -> SectionBody {
    if positions.is_empty() {
        return placeholder("No open positions");
    }

    let rows = positions
        .iter()
        .map(|p| {
            vec![
                Cell::plain(&p.symbol).strong(),
                direction_cell(&p.direction),
                Cell::plain(format_volume(p.volume)),
                Cell::plain(format_price(p.price)),
                Cell::toned(p.status.as_str(), status_tone(&p.status)),
                Cell::plain(&p.deal_id),
                Cell::plain(format_time(&p.timestamp)),
                mirrored_badge(p.mt5_mirrored),
            ]
        })
        .collect();

    SectionBody::Table(Table {
        headers: HEADERS.to_vec(),
        rows,
    })
}
