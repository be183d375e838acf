//! Loading listings from saved responses.

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use hmis_client::InertiaPage;
use hmis_core::Page;

/// Parse a listing saved from the server.
///
/// Accepts a full Inertia page object, a bare `props` object holding `prop`,
/// or the listing itself (any of the envelope shapes `Page` understands).
pub fn parse_listing<T: DeserializeOwned>(json: &str, prop: &str) -> Result<Page<T>> {
    let value: Value = serde_json::from_str(json).context("listing is not valid JSON")?;

    if value.get("component").is_some() && value.get("props").is_some() {
        let page: InertiaPage = serde_json::from_value(value).context("malformed page object")?;
        return page.prop(prop).map_err(Into::into);
    }

    let listing = match value.get(prop) {
        Some(inner) => inner.clone(),
        None => value,
    };
    serde_json::from_value(listing).with_context(|| format!("malformed `{prop}` listing"))
}

pub fn read_listing<T: DeserializeOwned>(path: &Path, prop: &str) -> Result<Page<T>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let page = parse_listing(&json, prop)?;
    tracing::debug!(path = %path.display(), rows = page.len(), "loaded listing");
    Ok(page)
}
