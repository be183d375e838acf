//! Terminal reports over the pharmacy inventory views.
//!
//! Listings come either from a saved page response or straight from the
//! server through `hmis-client`, and are rendered as text tables or JSON.

pub mod render;
pub mod source;

use core::str::FromStr;

use serde::Serialize;

pub use render::{ExpiryReport, ExpiryRow, StockReport, StockRow};
pub use source::{parse_listing, read_listing};

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other:?} (expected text or json)")),
        }
    }
}

pub trait Render: Serialize {
    fn to_text(&self) -> String;

    fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        match format {
            OutputFormat::Text => Ok(self.to_text()),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Render for ExpiryReport {
    fn to_text(&self) -> String {
        ExpiryReport::to_text(self)
    }
}

impl Render for StockReport {
    fn to_text(&self) -> String {
        StockReport::to_text(self)
    }
}
