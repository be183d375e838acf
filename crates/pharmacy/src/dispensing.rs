//! Dispensing readiness for a patient's reviewed prescriptions and supplies.
//!
//! Medication is only released against a paid, reviewed prescription; the
//! server decides `can_dispense` and the client summarizes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hmis_core::date::{option_timestamp, timestamp};
use hmis_core::{BatchId, DrugId, Entity, PrescriptionId};

use crate::lenient;

/// Billing state of the charge attached to a prescription.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Voided,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescribedDrug {
    pub id: DrugId,
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub form: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub unit_type: String,
    #[serde(default)]
    pub strength: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: PrescriptionId,
    pub drug_id: DrugId,
    pub drug: PrescribedDrug,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u64,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity_to_dispense: u64,
    #[serde(default, deserialize_with = "lenient::text")]
    pub dosage: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub frequency: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub duration: String,
    pub status: String,
    #[serde(default)]
    pub dispensing_notes: Option<String>,
}

impl Prescription {
    /// Reviewed quantity, falling back to the prescribed quantity when the
    /// review left it unset.
    pub fn effective_quantity(&self) -> u64 {
        if self.quantity_to_dispense > 0 {
            self.quantity_to_dispense
        } else {
            self.quantity
        }
    }
}

impl Entity for Prescription {
    type Id = PrescriptionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A batch the pharmacist can draw from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableBatch {
    pub id: BatchId,
    pub batch_number: String,
    #[serde(with = "timestamp")]
    pub expiry_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub available_quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionDispensing {
    pub prescription: Prescription,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub can_dispense: bool,
    #[serde(default)]
    pub available_batches: Vec<AvailableBatch>,
}

impl PrescriptionDispensing {
    /// Batches ordered first-expiry-first.
    pub fn batches_by_expiry(&self) -> Vec<&AvailableBatch> {
        let mut batches: Vec<&AvailableBatch> = self.available_batches.iter().collect();
        batches.sort_by_key(|b| (b.expiry_date, b.id));
        batches
    }

    /// Units available across all listed batches.
    pub fn available_quantity(&self) -> u64 {
        self.available_batches.iter().map(|b| b.available_quantity).sum()
    }
}

/// Consumable used during a minor procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplyDispensing {
    pub id: u64,
    pub drug_id: DrugId,
    pub drug: PrescribedDrug,
    #[serde(default, deserialize_with = "lenient::quantity")]
    pub quantity: u64,
    #[serde(default)]
    pub dispensed: bool,
    #[serde(default, with = "option_timestamp")]
    pub dispensed_at: Option<DateTime<Utc>>,
}

/// A dispensable line item, tagged by `item_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum DispenseItem {
    Drug(PrescriptionDispensing),
    Supply(SupplyDispensing),
}

impl DispenseItem {
    pub fn can_dispense(&self) -> bool {
        match self {
            DispenseItem::Drug(p) => p.can_dispense,
            DispenseItem::Supply(s) => !s.dispensed,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DispenseItem::Drug(p) => &p.prescription.drug.name,
            DispenseItem::Supply(s) => &s.drug.name,
        }
    }
}

/// Page-level readiness summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispenseOverview {
    /// Every prescription is payable-and-paid (an empty list counts as paid).
    pub all_paid: bool,
    pub any_can_dispense: bool,
    /// Prescriptions the server does not allow to be dispensed yet.
    pub blocked: Vec<PrescriptionId>,
}

impl DispenseOverview {
    pub fn from_prescriptions(items: &[PrescriptionDispensing]) -> Self {
        Self {
            all_paid: items.iter().all(|p| p.can_dispense),
            any_can_dispense: items.iter().any(|p| p.can_dispense),
            blocked: items
                .iter()
                .filter(|p| !p.can_dispense)
                .map(|p| p.prescription.id)
                .collect(),
        }
    }

    /// Warning shown when some medication is still unpaid.
    pub fn payment_warning(&self) -> Option<&'static str> {
        (!self.all_paid).then_some(
            "Some medications are not yet paid for. Please ensure payment before dispensing.",
        )
    }
}
