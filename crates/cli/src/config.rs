use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tradewatch_feed::FeedConfig;
use tradewatch_render::Theme;

/// Contents of the optional TOML config file.
///
/// ```toml
/// [feed]
/// url = "ws://localhost:8765"
/// reconnect_delay_secs = 3
///
/// [ui]
/// theme = "dark"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: Theme,
}

/// Values given on the command line (or through the environment), which win
/// over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub reconnect_delay_secs: Option<u64>,
    pub theme: Option<Theme>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(url) = overrides.url {
            self.feed.url = url;
        }
        if let Some(delay) = overrides.reconnect_delay_secs {
            self.feed.reconnect_delay_secs = delay;
        }
        if let Some(theme) = overrides.theme {
            self.ui.theme = theme;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.feed.validate()?;
        Ok(())
    }
}
