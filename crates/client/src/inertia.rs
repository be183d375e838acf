//! Inertia page objects and the typed views read from their props.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use hmis_core::Page;
use hmis_pharmacy::InventoryDrug;
use hmis_radiology::{ImagingOrder, WorklistStats};

use crate::error::{ClientError, ClientResult};

/// Response body of a request sent with `X-Inertia: true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InertiaPage {
    pub component: String,
    #[serde(default)]
    pub props: Map<String, Value>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub version: Option<Value>,
}

impl InertiaPage {
    /// Decode one prop. Fails with [`ClientError::MissingProp`] when the key
    /// is absent or `null`.
    pub fn prop<T: DeserializeOwned>(&self, key: &str) -> ClientResult<T> {
        match self.props.get(key) {
            None | Some(Value::Null) => Err(ClientError::MissingProp(key.to_string())),
            Some(value) => T::deserialize(value)
                .map_err(|e| ClientError::Parse(format!("prop `{key}`: {e}"))),
        }
    }

    /// Decode an optional prop; absent or `null` gives `None`.
    pub fn optional_prop<T: DeserializeOwned>(&self, key: &str) -> ClientResult<Option<T>> {
        match self.prop(key) {
            Ok(v) => Ok(Some(v)),
            Err(ClientError::MissingProp(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Server-computed header cards of the inventory page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub low_stock: u64,
    #[serde(default)]
    pub out_of_stock: u64,
    #[serde(default)]
    pub total_value: f64,
}

/// Props of the inventory page.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryView {
    pub drugs: Page<InventoryDrug>,
    pub categories: Vec<String>,
    pub stats: Option<InventoryStats>,
}

impl InventoryView {
    pub fn from_page(page: &InertiaPage) -> ClientResult<Self> {
        Ok(Self {
            drugs: page.prop("drugs")?,
            categories: page.optional_prop("categories")?.unwrap_or_default(),
            stats: page.optional_prop("stats")?,
        })
    }
}

/// Props of the radiology worklist.
#[derive(Debug, Clone, PartialEq)]
pub struct Worklist {
    pub orders: Page<ImagingOrder>,
    pub stats: WorklistStats,
    pub modalities: Vec<String>,
}

impl Worklist {
    pub fn from_page(page: &InertiaPage) -> ClientResult<Self> {
        Ok(Self {
            orders: page.prop("orders")?,
            stats: page.optional_prop("stats")?.unwrap_or_default(),
            modalities: page.optional_prop("modalities")?.unwrap_or_default(),
        })
    }
}
