//! Inventory listing filters.
//!
//! Same semantics as the server's `search`, `category` and `stock_status`
//! query parameters, so a page that already holds every row can filter
//! locally without another round-trip.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::InventoryDrug;
use crate::stock::StockStatus;

/// Case-insensitive substring match over name, category and form.
///
/// An empty (or whitespace-only) term matches every drug.
pub fn matches_search(drug: &InventoryDrug, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    [&drug.name, &drug.category, &drug.form]
        .iter()
        .any(|field| field.to_lowercase().contains(&term))
}

/// Distinct non-empty categories, sorted.
pub fn categories<'a>(drugs: impl IntoIterator<Item = &'a InventoryDrug>) -> Vec<String> {
    drugs
        .into_iter()
        .map(|d| d.category.trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Combined filter state of the inventory table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_status: Option<StockStatus>,
}

impl InventoryFilter {
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_stock_status(mut self, status: StockStatus) -> Self {
        self.stock_status = Some(status);
        self
    }

    pub fn matches(&self, drug: &InventoryDrug) -> bool {
        if let Some(term) = &self.search {
            if !matches_search(drug, term) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if drug.category != *category {
                return false;
            }
        }
        if let Some(status) = self.stock_status {
            // out_of_stock ⇔ total == 0; low_stock ⇔ flagged && total > 0;
            // in_stock ⇔ !flagged && total > 0. Exactly the classifier's buckets.
            if drug.stock_status() != status {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, drugs: &'a [InventoryDrug]) -> Vec<&'a InventoryDrug> {
        drugs.iter().filter(|d| self.matches(d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmis_core::DrugId;

    fn drug(id: u64, name: &str, category: &str, form: &str, total: u64, low: bool) -> InventoryDrug {
        InventoryDrug {
            id: DrugId::new(id),
            name: name.into(),
            category: category.into(),
            form: form.into(),
            unit_type: "unit".into(),
            total_stock: total,
            minimum_stock_level: 20,
            is_low_stock: low,
            batches_count: 1,
            next_expiry: None,
            unit_price: None,
        }
    }

    fn sample() -> Vec<InventoryDrug> {
        vec![
            drug(1, "Amoxicillin", "Antibiotics", "capsule", 0, true),
            drug(2, "Artemether", "Antimalarials", "tablet", 5, true),
            drug(3, "Paracetamol Syrup", "Analgesics", "syrup", 80, false),
            drug(4, "Ceftriaxone", "Antibiotics", "injection", 12, false),
        ]
    }

    #[test]
    fn search_is_case_insensitive_over_name_category_and_form() {
        let drugs = sample();
        let ids = |term: &str| -> Vec<u64> {
            InventoryFilter::default()
                .with_search(term)
                .apply(&drugs)
                .iter()
                .map(|d| d.id.get())
                .collect()
        };

        assert_eq!(ids("AMOX"), vec![1]);
        assert_eq!(ids("antibiotic"), vec![1, 4]);
        assert_eq!(ids("SYRUP"), vec![3]);
        assert_eq!(ids("  "), vec![1, 2, 3, 4]);
    }

    #[test]
    fn stock_status_filter_matches_server_predicates() {
        let drugs = sample();
        for status in [StockStatus::OutOfStock, StockStatus::LowStock, StockStatus::InStock] {
            let filtered = InventoryFilter::default().with_stock_status(status).apply(&drugs);
            for d in &drugs {
                let server_says = match status {
                    StockStatus::OutOfStock => d.total_stock == 0,
                    StockStatus::LowStock => d.is_low_stock && d.total_stock > 0,
                    StockStatus::InStock => !d.is_low_stock && d.total_stock > 0,
                };
                assert_eq!(filtered.iter().any(|f| f.id == d.id), server_says);
            }
        }
    }

    #[test]
    fn filters_combine() {
        let drugs = sample();
        let filtered = InventoryFilter::default()
            .with_category("Antibiotics")
            .with_stock_status(StockStatus::InStock)
            .apply(&drugs);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Ceftriaxone");
    }

    #[test]
    fn categories_are_distinct_and_sorted() {
        let mut drugs = sample();
        drugs.push(drug(5, "Unknown", "", "tablet", 1, false));
        assert_eq!(categories(&drugs), vec!["Analgesics", "Antibiotics", "Antimalarials"]);
    }
}
