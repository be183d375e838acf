//! Billing code mappings.
//!
//! Links between billable items (drugs, lab services, procedures and
//! consumables) and insurance tariff codes, as listed on the mapping admin
//! page.

pub mod mapping;

pub use mapping::{ItemType, MappedItem, MappingStats, NhisMapping, NhisTariff};
