//! Stock-level classification for inventory rows.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use hmis_core::{DomainError, ValueObject};

use crate::bucket::Bucket;
use crate::model::InventoryDrug;

/// Primary stock category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    InStock,
}

impl ValueObject for StockStatus {}

impl Bucket for StockStatus {
    const ALL: &'static [Self] = &[Self::OutOfStock, Self::LowStock, Self::InStock];

    fn as_str(self) -> &'static str {
        match self {
            Self::OutOfStock => "out_of_stock",
            Self::LowStock => "low_stock",
            Self::InStock => "in_stock",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::OutOfStock => "Out of Stock",
            Self::LowStock => "Low Stock",
            Self::InStock => "In Stock",
        }
    }
}

impl FromStr for StockStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown stock status: {s:?}")))
    }
}

/// `total_stock == 0` wins over the server's low-stock flag.
pub fn classify_stock(total_stock: u64, is_low_stock: bool) -> StockStatus {
    if total_stock == 0 {
        StockStatus::OutOfStock
    } else if is_low_stock {
        StockStatus::LowStock
    } else {
        StockStatus::InStock
    }
}

/// Critical: still in stock but at or below half the configured minimum.
///
/// `total ≤ minimum × 0.5` evaluated as `2 × total ≤ minimum` to stay in
/// integers.
pub fn is_critical(total_stock: u64, minimum_stock_level: u64) -> bool {
    total_stock > 0 && total_stock.saturating_mul(2) <= minimum_stock_level
}

impl InventoryDrug {
    pub fn stock_status(&self) -> StockStatus {
        classify_stock(self.total_stock, self.is_low_stock)
    }

    pub fn is_critical(&self) -> bool {
        is_critical(self.total_stock, self.minimum_stock_level)
    }
}
