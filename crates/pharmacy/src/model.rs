//! Read-only views over the pharmacy props delivered by the server.
//!
//! These records are fetched per page visit and never mutated client-side;
//! any dispense/receive action makes them stale until the next fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hmis_core::date::{option_timestamp, timestamp};
use hmis_core::{BatchId, DrugId, Entity, SupplierId};

use crate::lenient;

/// Drug summary embedded in batch rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugRef {
    pub id: DrugId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub form: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit_type: String,
}

/// Supplier summary embedded in batch rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierRef {
    pub id: SupplierId,
    pub name: String,
}

/// A received lot of a drug with its own expiry date and remaining quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugBatch {
    pub id: BatchId,
    pub drug: DrugRef,
    #[serde(default)]
    pub supplier: Option<SupplierRef>,
    pub batch_number: String,
    #[serde(with = "timestamp")]
    pub expiry_date: DateTime<Utc>,
    #[serde(default, with = "option_timestamp")]
    pub manufacture_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity_remaining: u64,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub selling_price_per_unit: f64,
    #[serde(default, with = "option_timestamp")]
    pub received_date: Option<DateTime<Utc>>,
}

impl DrugBatch {
    /// `quantity_remaining × selling_price_per_unit`.
    pub fn stock_value(&self) -> f64 {
        self.quantity_remaining as f64 * self.selling_price_per_unit
    }
}

impl Entity for DrugBatch {
    type Id = BatchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One row of the inventory listing (drug with aggregated stock).
///
/// `is_low_stock` is computed by the server against the configured minimum
/// and is authoritative; the client never recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDrug {
    pub id: DrugId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub category: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub form: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit_type: String,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub total_stock: u64,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub minimum_stock_level: u64,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_low_stock: bool,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub batches_count: u64,
    #[serde(default, with = "option_timestamp")]
    pub next_expiry: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::option_amount")]
    pub unit_price: Option<f64>,
}

impl InventoryDrug {
    /// `total_stock × unit_price`, with a missing price counting as zero.
    pub fn stock_value(&self) -> f64 {
        self.total_stock as f64 * self.unit_price.unwrap_or(0.0)
    }
}

impl Entity for InventoryDrug {
    type Id = DrugId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
