//! Pharmacy inventory domain module.
//!
//! Expiry and stock risk classification, dashboard aggregation, listing
//! filters and dispensing readiness, implemented as deterministic functions
//! over server-supplied records (no IO, no HTTP, no storage).

pub mod bucket;
pub mod dispensing;
pub mod expiry;
pub mod filter;
mod lenient;
pub mod model;
pub mod stock;
pub mod summary;

pub use bucket::Bucket;
pub use dispensing::{
    AvailableBatch, DispenseItem, DispenseOverview, PaymentStatus, PrescribedDrug, Prescription,
    PrescriptionDispensing, SupplyDispensing,
};
pub use expiry::{
    ActionPriority, DaysUntilExpiry, EXPIRES_SOON_DAYS, EXPIRING_DAYS, ExpiryBucket, ExpiryStatus,
    classify_expiry,
};
pub use filter::{InventoryFilter, categories, matches_search};
pub use model::{DrugBatch, DrugRef, InventoryDrug, SupplierRef};
pub use stock::{StockStatus, classify_stock, is_critical};
pub use summary::{
    BucketCounts, ExpirySummary, StockSummary, count_by_bucket, inventory_value, total_value_at_risk,
};
