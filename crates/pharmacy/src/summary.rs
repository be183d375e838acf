//! Dashboard aggregates over classified batches and drugs.
//!
//! Pure reductions: no IO, no mutation of the inputs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use hmis_core::Page;

use crate::bucket::Bucket;
use crate::expiry::ExpiryBucket;
use crate::model::{DrugBatch, InventoryDrug};
use crate::stock::StockStatus;

/// Item count per bucket. Every bucket of `B` is present, zero if empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketCounts<B: Bucket> {
    counts: BTreeMap<B, usize>,
}

impl<B: Bucket> BucketCounts<B> {
    fn empty() -> Self {
        Self {
            counts: B::ALL.iter().map(|b| (*b, 0)).collect(),
        }
    }

    pub fn get(&self, bucket: B) -> usize {
        self.counts.get(&bucket).copied().unwrap_or(0)
    }

    /// Sum over all buckets (equals the number of classified items).
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// `(bucket, count)` pairs in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (B, usize)> + '_ {
        self.counts.iter().map(|(b, n)| (*b, *n))
    }
}

impl<B: Bucket> Serialize for BucketCounts<B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len()))?;
        for (bucket, count) in &self.counts {
            map.serialize_entry(bucket.as_str(), count)?;
        }
        map.end()
    }
}

/// Classify every item and count the results per bucket.
pub fn count_by_bucket<T, B, F>(items: impl IntoIterator<Item = T>, mut classify: F) -> BucketCounts<B>
where
    B: Bucket,
    F: FnMut(T) -> B,
{
    let mut counts = BucketCounts::<B>::empty();
    for item in items {
        *counts.counts.entry(classify(item)).or_insert(0) += 1;
    }
    counts
}

/// `Σ quantity_remaining × selling_price_per_unit` over the whole input.
///
/// "At risk" means everything in the (already filtered) expiring view; no
/// further filtering happens here.
pub fn total_value_at_risk<'a>(batches: impl IntoIterator<Item = &'a DrugBatch>) -> f64 {
    batches.into_iter().map(DrugBatch::stock_value).sum()
}

/// `Σ total_stock × unit_price`, missing prices counting as zero.
pub fn inventory_value<'a>(drugs: impl IntoIterator<Item = &'a InventoryDrug>) -> f64 {
    drugs.into_iter().map(InventoryDrug::stock_value).sum()
}

/// Summary cards of the expiring-batches view.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ExpirySummary {
    /// Batches to monitor (server total across pages when paginated).
    pub total: u64,
    /// Already expired: immediate removal.
    pub expired: u64,
    /// Expiring within 7 days.
    pub expires_soon: u64,
    /// Everything else still being tracked.
    pub monitor: u64,
    /// Potential loss value of the listed batches.
    pub value_at_risk: f64,
    pub by_bucket: BucketCounts<ExpiryBucket>,
}

impl ExpirySummary {
    /// Summarize a set of batches that is the whole listing.
    pub fn from_batches(batches: &[DrugBatch], now: DateTime<Utc>) -> Self {
        Self::build(batches, batches.len() as u64, now)
    }

    /// Summarize one page; `total` comes from the server's pagination meta
    /// while the bucket counts and value cover the rows on this page.
    pub fn from_page(page: &Page<DrugBatch>, now: DateTime<Utc>) -> Self {
        Self::build(&page.data, page.total(), now)
    }

    fn build(batches: &[DrugBatch], total: u64, now: DateTime<Utc>) -> Self {
        let by_bucket = count_by_bucket(batches, |b| b.expiry_bucket(now));
        let expired = by_bucket.get(ExpiryBucket::Expired) as u64;
        let expires_soon = by_bucket.get(ExpiryBucket::ExpiresSoon) as u64;
        let summary = Self {
            total,
            expired,
            expires_soon,
            monitor: total.saturating_sub(expired).saturating_sub(expires_soon),
            value_at_risk: total_value_at_risk(batches),
            by_bucket,
        };

        tracing::debug!(
            total = summary.total,
            expired = summary.expired,
            expires_soon = summary.expires_soon,
            value_at_risk = summary.value_at_risk,
            "summarized expiring batches"
        );

        summary
    }

    /// Banner text shown above the listing; `None` when nothing is expiring.
    pub fn alert_message(&self) -> Option<String> {
        if self.total == 0 {
            return None;
        }

        let mut msg = format!(
            "{} batch{} {} approaching expiry.",
            self.total,
            if self.total != 1 { "es" } else { "" },
            if self.total == 1 { "is" } else { "are" },
        );
        if self.expired > 0 {
            msg.push_str(&format!(
                " {} {} already expired.",
                self.expired,
                if self.expired == 1 { "has" } else { "have" }
            ));
        }
        if self.expires_soon > 0 {
            msg.push_str(&format!(
                " {} {} within 7 days.",
                self.expires_soon,
                if self.expires_soon == 1 { "expires" } else { "expire" }
            ));
        }
        Some(msg)
    }
}

/// Summary cards of the inventory and low-stock views.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StockSummary {
    pub total: u64,
    /// Server-flagged low stock (includes out-of-stock rows the server flags).
    pub low_stock: u64,
    pub out_of_stock: u64,
    /// In stock but at or below half the minimum level.
    pub critical: u64,
    pub total_value: f64,
    pub by_status: BucketCounts<StockStatus>,
}

impl StockSummary {
    pub fn from_drugs(drugs: &[InventoryDrug]) -> Self {
        let by_status = count_by_bucket(drugs, InventoryDrug::stock_status);
        let summary = Self {
            total: drugs.len() as u64,
            low_stock: drugs.iter().filter(|d| d.is_low_stock).count() as u64,
            out_of_stock: by_status.get(StockStatus::OutOfStock) as u64,
            critical: drugs.iter().filter(|d| d.is_critical()).count() as u64,
            total_value: inventory_value(drugs),
            by_status,
        };

        tracing::debug!(
            total = summary.total,
            low_stock = summary.low_stock,
            out_of_stock = summary.out_of_stock,
            critical = summary.critical,
            "summarized inventory"
        );

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use hmis_core::{BatchId, DrugId};
    use proptest::prelude::*;

    use crate::model::DrugRef;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()
    }

    fn batch(id: u64, days: i64, qty: u64, price: f64) -> DrugBatch {
        DrugBatch {
            id: BatchId::new(id),
            drug: DrugRef {
                id: DrugId::new(1),
                name: "Metformin".into(),
                form: "tablet".into(),
                unit_type: "tablet".into(),
            },
            supplier: None,
            batch_number: format!("MET-{id}"),
            expiry_date: now() + Duration::days(days),
            manufacture_date: None,
            quantity_remaining: qty,
            selling_price_per_unit: price,
            received_date: None,
        }
    }

    fn drug(id: u64, total: u64, minimum: u64, low: bool, price: Option<f64>) -> InventoryDrug {
        InventoryDrug {
            id: DrugId::new(id),
            name: format!("Drug {id}"),
            category: "general".into(),
            form: "tablet".into(),
            unit_type: "tablet".into(),
            total_stock: total,
            minimum_stock_level: minimum,
            is_low_stock: low,
            batches_count: 1,
            next_expiry: None,
            unit_price: price,
        }
    }

    #[test]
    fn value_at_risk_sums_quantity_times_price() {
        let batches = vec![batch(1, 3, 10, 2.5), batch(2, 3, 0, 5.0)];
        assert_eq!(total_value_at_risk(&batches), 25.0);
    }

    #[test]
    fn counts_include_every_bucket() {
        let counts = count_by_bucket(Vec::<&DrugBatch>::new(), |b| b.expiry_bucket(now()));
        assert_eq!(counts.iter().count(), ExpiryBucket::ALL.len());
        assert_eq!(counts.total(), 0);
        assert_eq!(
            serde_json::to_value(&counts).unwrap(),
            serde_json::json!({ "expired": 0, "expires_soon": 0, "expiring": 0, "stable": 0 })
        );
    }

    #[test]
    fn expiry_summary_splits_urgency() {
        let batches = vec![
            batch(1, -9, 4, 1.0),
            batch(2, 0, 2, 10.0),
            batch(3, 5, 1, 3.0),
            batch(4, 20, 10, 0.5),
        ];
        let summary = ExpirySummary::from_batches(&batches, now());

        assert_eq!(summary.total, 4);
        assert_eq!(summary.expired, 1);
        assert_eq!(summary.expires_soon, 2);
        assert_eq!(summary.monitor, 1);
        assert_eq!(summary.value_at_risk, 4.0 + 20.0 + 3.0 + 5.0);
        assert_eq!(
            summary.alert_message().unwrap(),
            "4 batches are approaching expiry. 1 has already expired. 2 expire within 7 days."
        );
    }

    #[test]
    fn expiry_summary_uses_server_total_for_pages() {
        let page = Page {
            data: vec![batch(1, -1, 1, 1.0)],
            meta: hmis_core::PageMeta {
                current_page: 1,
                last_page: 20,
                per_page: 1,
                total: 20,
                from: Some(1),
                to: Some(1),
            },
            links: Default::default(),
        };
        let summary = ExpirySummary::from_page(&page, now());
        assert_eq!(summary.total, 20);
        assert_eq!(summary.monitor, 19);
    }

    #[test]
    fn empty_expiry_summary_has_no_alert() {
        let summary = ExpirySummary::from_batches(&[], now());
        assert_eq!(summary.alert_message(), None);
        assert_eq!(summary.value_at_risk, 0.0);
    }

    #[test]
    fn single_batch_alert_is_singular() {
        let summary = ExpirySummary::from_batches(&[batch(1, 3, 1, 1.0)], now());
        assert_eq!(
            summary.alert_message().unwrap(),
            "1 batch is approaching expiry. 1 expires within 7 days."
        );
    }

    #[test]
    fn stock_summary_counts_low_out_and_critical() {
        let drugs = vec![
            drug(1, 0, 10, true, Some(4.0)),
            drug(2, 5, 10, true, Some(2.0)),
            drug(3, 8, 10, true, None),
            drug(4, 100, 10, false, Some(1.5)),
        ];
        let summary = StockSummary::from_drugs(&drugs);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.low_stock, 3);
        assert_eq!(summary.out_of_stock, 1);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.total_value, 10.0 + 150.0);
        assert_eq!(summary.by_status.get(StockStatus::LowStock), 2);
        assert_eq!(summary.by_status.get(StockStatus::InStock), 1);
    }

    proptest! {
        /// Property: every batch lands in exactly one bucket.
        #[test]
        fn bucket_counts_sum_to_item_count(days in prop::collection::vec(-60i64..90, 0..50)) {
            let batches: Vec<DrugBatch> = days
                .iter()
                .enumerate()
                .map(|(i, d)| batch(i as u64, *d, 1, 1.0))
                .collect();
            let counts = count_by_bucket(&batches, |b| b.expiry_bucket(now()));
            prop_assert_eq!(counts.total(), batches.len());
        }
    }
}
