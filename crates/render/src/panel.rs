use tradewatch_core::ConnectionState;

use crate::theme::Theme;
use crate::tone::Tone;

/// A piece of text with its semantic color.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
    /// Drawn bold where the backend supports it.
    pub strong: bool,
}

impl Cell {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Neutral,
            strong: false,
        }
    }

    pub fn toned(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
            strong: false,
        }
    }

    pub fn strong(mut self) -> Self {
        self.strong = true;
        self
    }
}

/// Connection summary shown at the top of the monitor view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCard {
    pub connection: Cell,
    pub venue: Cell,
    /// Only present while the venue is connected.
    pub balance: Option<Cell>,
    /// Free-text session status from the backend.
    pub session_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metric {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

/// A section holds either a table or, for an empty list, a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Table(Table),
    Placeholder(Cell),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: &'static str,
    pub body: SectionBody,
}

/// One fully derived frame of a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub title: &'static str,
    pub theme: Theme,
    pub connection: ConnectionState,
    pub status: Option<StatusCard>,
    pub summary: Vec<Metric>,
    pub section: Section,
    pub footer: Option<String>,
}

impl Panel {
    /// The table of the main section, if it has rows.
    pub fn table(&self) -> Option<&Table> {
        match &self.section.body {
            SectionBody::Table(table) => Some(table),
            SectionBody::Placeholder(_) => None,
        }
    }
}

pub(crate) fn direction_cell(direction: &tradewatch_core::Direction) -> Cell {
    Cell::toned(direction.as_str(), crate::tone::direction_tone(direction)).strong()
}

pub(crate) fn placeholder(text: &str) -> SectionBody {
    SectionBody::Placeholder(Cell::toned(text, Tone::Info))
}
