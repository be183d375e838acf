use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hmis_core::date::option_timestamp;
use hmis_core::{
    ConsumableId, DomainError, DrugId, Entity, LabServiceId, MappingId, Page, ProcedureId,
    TariffId, ValueObject,
};

/// Kind of billable item a mapping points at.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Drug,
    LabService,
    Procedure,
    Consumable,
}

impl ValueObject for ItemType {}

impl ItemType {
    pub const ALL: &'static [Self] = &[Self::Drug, Self::LabService, Self::Procedure, Self::Consumable];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Drug => "drug",
            Self::LabService => "lab_service",
            Self::Procedure => "procedure",
            Self::Consumable => "consumable",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Drug => "Drug",
            Self::LabService => "Lab Service",
            Self::Procedure => "Procedure",
            Self::Consumable => "Consumable",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown item type: {s:?}")))
    }
}

/// The mapped item. `item_type` selects which id space `item_id` belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum MappedItem {
    Drug { item_id: DrugId },
    LabService { item_id: LabServiceId },
    Procedure { item_id: ProcedureId },
    Consumable { item_id: ConsumableId },
}

impl MappedItem {
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Drug { .. } => ItemType::Drug,
            Self::LabService { .. } => ItemType::LabService,
            Self::Procedure { .. } => ItemType::Procedure,
            Self::Consumable { .. } => ItemType::Consumable,
        }
    }
}

/// Tariff entry embedded in mapping rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NhisTariff {
    pub id: TariffId,
    pub nhis_code: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: f64,
}

/// One row of the billing code mapping listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NhisMapping {
    pub id: MappingId,
    #[serde(flatten)]
    pub item: MappedItem,
    pub item_code: String,
    pub nhis_tariff_id: TariffId,
    #[serde(default)]
    pub nhis_tariff: Option<NhisTariff>,
    #[serde(default, with = "option_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl NhisMapping {
    pub fn item_type(&self) -> ItemType {
        self.item.item_type()
    }
}

impl Entity for NhisMapping {
    type Id = MappingId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Header cards of the mapping page.
///
/// `total` is the server-reported count across all pages; the per-type
/// counts cover the current page only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MappingStats {
    pub total: u64,
    pub drugs: u64,
    pub lab_services: u64,
    pub procedures: u64,
    pub consumables: u64,
}

impl MappingStats {
    pub fn from_page(page: &Page<NhisMapping>) -> Self {
        let mut stats = Self {
            total: if page.total() > 0 {
                page.total()
            } else {
                page.len() as u64
            },
            ..Self::default()
        };
        for mapping in page.iter() {
            match mapping.item_type() {
                ItemType::Drug => stats.drugs += 1,
                ItemType::LabService => stats.lab_services += 1,
                ItemType::Procedure => stats.procedures += 1,
                ItemType::Consumable => stats.consumables += 1,
            }
        }
        stats
    }
}
