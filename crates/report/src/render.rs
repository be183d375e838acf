//! Dashboard summaries rendered for the terminal or as JSON.

use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use hmis_core::Page;
use hmis_pharmacy::{
    Bucket, DrugBatch, ExpirySummary, InventoryDrug, InventoryFilter, StockSummary,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryRow {
    pub batch_number: String,
    pub drug: String,
    pub expiry_date: NaiveDate,
    pub days_until_expiry: i64,
    pub relative: String,
    pub status: &'static str,
    pub priority: &'static str,
    pub quantity: u64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpiryReport {
    pub as_of: DateTime<Utc>,
    pub summary: ExpirySummary,
    pub alert: Option<String>,
    pub rows: Vec<ExpiryRow>,
}

impl ExpiryReport {
    pub fn build(batches: &Page<DrugBatch>, now: DateTime<Utc>) -> Self {
        let rows = batches
            .iter()
            .map(|b| {
                let status = b.expiry_status(now);
                ExpiryRow {
                    batch_number: b.batch_number.clone(),
                    drug: b.drug.name.clone(),
                    expiry_date: b.expiry_date.date_naive(),
                    days_until_expiry: status.days.get(),
                    relative: status.relative_label(),
                    status: status.bucket.label(),
                    priority: status.priority().as_str(),
                    quantity: b.quantity_remaining,
                    value: b.stock_value(),
                }
            })
            .collect();

        let summary = ExpirySummary::from_page(batches, now);
        Self {
            as_of: now,
            alert: summary.alert_message(),
            summary,
            rows,
        }
    }

    pub fn to_text(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();
        let _ = writeln!(out, "Expiring batches as of {}", self.as_of.format("%Y-%m-%d"));
        let _ = writeln!(
            out,
            "  Total: {}  Expired: {}  Expires soon: {}  Monitor: {}  Value at risk: {:.2}",
            s.total, s.expired, s.expires_soon, s.monitor, s.value_at_risk
        );
        if let Some(alert) = &self.alert {
            let _ = writeln!(out, "  {alert}");
        }
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<14} {:<24} {:<10}  {:<12} {:<13} {:>8} {:>10}",
            "BATCH", "DRUG", "EXPIRY", "WHEN", "STATUS", "QTY", "VALUE"
        );
        for r in &self.rows {
            let _ = writeln!(
                out,
                "{:<14} {:<24} {}  {:<12} {:<13} {:>8} {:>10.2}",
                truncate(&r.batch_number, 14),
                truncate(&r.drug, 24),
                r.expiry_date.format("%Y-%m-%d"),
                r.relative,
                r.status,
                r.quantity,
                r.value
            );
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockRow {
    pub name: String,
    pub category: String,
    pub total_stock: u64,
    pub minimum_stock_level: u64,
    pub status: &'static str,
    pub critical: bool,
    pub expiring_soon: bool,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockReport {
    pub title: String,
    pub as_of: DateTime<Utc>,
    pub summary: StockSummary,
    pub rows: Vec<StockRow>,
}

impl StockReport {
    /// Summary cards cover every drug given; rows are the ones `filter` keeps.
    pub fn build(
        title: impl Into<String>,
        drugs: &[InventoryDrug],
        filter: &InventoryFilter,
        now: DateTime<Utc>,
    ) -> Self {
        let rows = filter
            .apply(drugs)
            .into_iter()
            .map(|d| StockRow {
                name: d.name.clone(),
                category: d.category.clone(),
                total_stock: d.total_stock,
                minimum_stock_level: d.minimum_stock_level,
                status: d.stock_status().label(),
                critical: d.is_critical(),
                expiring_soon: d.is_expiring_soon(now),
                value: d.stock_value(),
            })
            .collect();

        Self {
            title: title.into(),
            as_of: now,
            summary: StockSummary::from_drugs(drugs),
            rows,
        }
    }

    pub fn to_text(&self) -> String {
        let s = &self.summary;
        let mut out = String::new();
        let _ = writeln!(out, "{} as of {}", self.title, self.as_of.format("%Y-%m-%d"));
        let _ = writeln!(
            out,
            "  Drugs: {}  Low stock: {}  Out of stock: {}  Critical: {}  Value: {:.2}",
            s.total, s.low_stock, s.out_of_stock, s.critical, s.total_value
        );
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<28} {:<18} {:>8} {:>8}  {:<13} {:>10}",
            "DRUG", "CATEGORY", "STOCK", "MIN", "STATUS", "VALUE"
        );
        for r in &self.rows {
            let mut flags = String::new();
            if r.critical {
                flags.push_str(" critical");
            }
            if r.expiring_soon {
                flags.push_str(" expiring");
            }
            let _ = writeln!(
                out,
                "{:<28} {:<18} {:>8} {:>8}  {:<13} {:>10.2}{}",
                truncate(&r.name, 28),
                truncate(&r.category, 18),
                r.total_stock,
                r.minimum_stock_level,
                r.status,
                r.value,
                flags
            );
        }
        out
    }
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(width.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}
