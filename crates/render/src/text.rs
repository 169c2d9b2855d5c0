//! Plain-text backend, used for streaming output and logs.

use std::fmt::Write;

use crate::panel::{Cell, Panel, SectionBody, Table};
use crate::theme::Theme;
use crate::tone::Tone;

const COLUMN_GAP: &str = "  ";

/// Renders panels as text, optionally with ANSI colors.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextRenderer {
    color: bool,
}

impl TextRenderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn render(&self, panel: &Panel) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== {} ({}) ==", panel.title, panel.connection);

        if let Some(card) = &panel.status {
            let mut line = vec![
                self.paint(&card.connection, panel.theme),
                self.paint(&card.venue, panel.theme),
            ];
            if let Some(balance) = &card.balance {
                line.push(self.paint(balance, panel.theme));
            }
            let _ = writeln!(out, "{}", line.join(" | "));
            let _ = writeln!(out, "Status: {}", card.session_status);
        }

        if !panel.summary.is_empty() {
            let metrics: Vec<String> = panel
                .summary
                .iter()
                .map(|m| format!("{}: {}", m.label, m.value))
                .collect();
            let _ = writeln!(out, "{}", metrics.join(COLUMN_GAP));
        }

        let _ = writeln!(out, "-- {} --", panel.section.title);
        match &panel.section.body {
            SectionBody::Table(table) => self.write_table(&mut out, table, panel.theme),
            SectionBody::Placeholder(cell) => {
                let _ = writeln!(out, "{}", self.paint(cell, panel.theme));
            }
        }

        if let Some(footer) = &panel.footer {
            let _ = writeln!(out, "{}", footer);
        }
        out
    }

    fn write_table(&self, out: &mut String, table: &Table, theme: Theme) {
        let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
        for row in &table.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.text.chars().count());
                }
            }
        }

        let header: Vec<String> = table
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<w$}", h, w = *w))
            .collect();
        let _ = writeln!(out, "{}", header.join(COLUMN_GAP).trim_end());

        for row in &table.rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| {
                    let pad = w.saturating_sub(cell.text.chars().count());
                    format!("{}{}", self.paint(cell, theme), " ".repeat(pad))
                })
                .collect();
            let _ = writeln!(out, "{}", cells.join(COLUMN_GAP).trim_end());
        }
    }

    fn paint(&self, cell: &Cell, theme: Theme) -> String {
        if !self.color {
            return cell.text.clone();
        }

        let mut codes = Vec::new();
        if cell.strong {
            codes.push("1");
        }
        if let Some(code) = ansi_code(cell.tone, theme) {
            codes.push(code);
        }
        if codes.is_empty() {
            return cell.text.clone();
        }
        format!("\x1b[{}m{}\x1b[0m", codes.join(";"), cell.text)
    }
}

fn ansi_code(tone: Tone, theme: Theme) -> Option<&'static str> {
    let code = match (tone, theme) {
        (Tone::Neutral, _) => return None,
        (Tone::Affirmative, Theme::Light) => "32",
        (Tone::Negative, Theme::Light) => "31",
        (Tone::Caution, Theme::Light) => "33",
        (Tone::Info, Theme::Light) => "34",
        (Tone::Affirmative, Theme::Dark) => "92",
        (Tone::Negative, Theme::Dark) => "91",
        (Tone::Caution, Theme::Dark) => "93",
        (Tone::Info, Theme::Dark) => "94",
    };
    Some(code)
}
