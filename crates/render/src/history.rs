use tradewatch_core::ClosedPosition;

use crate::format::{format_price, format_time, format_updated_at, format_volume};
use crate::panel::*;
use crate::tone::mirrored_badge;
use crate::ViewInput;

const HEADERS: [&str; 8] = [
    "Symbol",
    "Direction",
    "Volume",
    "Price",
    "Deal ID",
    "Open Time",
    "Close Time",
    "MT5",
];

/// History view: closed positions only.
pub fn render(input: &ViewInput<'_>) -> Panel {
    Panel {
        title: "Trade History",
        theme: input.theme,
        connection: input.connection,
        status: None,
        summary: Vec::new(),
        section: Section {
            title: "Trade History",
            body: closed_positions(&input.snapshot.closed_positions),
        },
        footer: input.updated_at.map(format_updated_at),
    }
}

fn closed_positions(positions: &[ClosedPosition]) -> SectionBody {
    if positions.is_empty() {
        return placeholder("No closed positions");
    }

    let rows = positions
        .iter()
        .map(|p| {
            vec![
                Cell::plain(&p.symbol).strong(),
                direction_cell(&p.direction),
                Cell::plain(format_volume(p.volume)),
                Cell::plain(format_price(p.price)),
                Cell::plain(&p.deal_id),
                Cell::plain(format_time(&p.open_timestamp)),
                Cell::plain(format_time(&p.close_timestamp)),
                mirrored_badge(p.mt5_mirrored),
            ]
        })
        .collect();

    SectionBody::Table(Table {
        headers: HEADERS.to_vec(),
        rows,
    })
}
