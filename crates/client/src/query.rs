//! Listing query parameters.
//!
//! Every filter setter resets pagination to the first page; absent or blank
//! values are left out of the request entirely.

use chrono::NaiveDate;
use hmis_pharmacy::{Bucket, StockStatus};
use hmis_radiology::{Priority, StatusFilter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    search: Option<String>,
    category: Option<String>,
    stock_status: Option<String>,
    item_type: Option<String>,
    date_filter: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    modality: Option<String>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    per_page: Option<u32>,
    page: Option<u32>,
}

fn non_blank(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = non_blank(term);
        self.page = None;
        self
    }

    pub fn with_category(mut self, category: Option<&str>) -> Self {
        self.category = category.and_then(non_blank);
        self.page = None;
        self
    }

    pub fn with_stock_status(mut self, status: Option<StockStatus>) -> Self {
        self.stock_status = status.map(|s| s.as_str().to_string());
        self.page = None;
        self
    }

    /// Item kind filter: `drug` or `supply` on the dispensing queue, one of
    /// the billing item types on the mapping listing.
    pub fn with_item_type(mut self, item_type: Option<&str>) -> Self {
        self.item_type = item_type.and_then(non_blank);
        self.page = None;
        self
    }

    /// Named date preset (`today`, `week`, ...), passed through as-is.
    pub fn with_date_filter(mut self, preset: Option<&str>) -> Self {
        self.date_filter = preset.and_then(non_blank);
        self.page = None;
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = Some(status.as_str().to_string());
        self.page = None;
        self
    }

    pub fn with_priority(mut self, priority: Option<Priority>) -> Self {
        self.priority = priority.map(|p| p.as_str().to_string());
        self.page = None;
        self
    }

    pub fn with_modality(mut self, modality: Option<&str>) -> Self {
        self.modality = modality.and_then(non_blank);
        self.page = None;
        self
    }

    pub fn with_date_range(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self.page = None;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page).filter(|n| *n > 0);
        self.page = None;
        self
    }

    /// Navigate to a page without touching the filters.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = (page > 1).then_some(page);
        self
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1)
    }

    pub fn per_page(&self) -> Option<u32> {
        self.per_page
    }

    /// `(name, value)` pairs for the set parameters, in a stable order.
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let text = [
            ("search", &self.search),
            ("category", &self.category),
            ("stock_status", &self.stock_status),
            ("item_type", &self.item_type),
            ("date_filter", &self.date_filter),
            ("status", &self.status),
            ("priority", &self.priority),
            ("modality", &self.modality),
        ];

        let mut pairs: Vec<(&'static str, String)> = text
            .into_iter()
            .filter_map(|(name, value)| value.as_ref().map(|v| (name, v.clone())))
            .collect();

        let dates = [("date_from", self.date_from), ("date_to", self.date_to)];
        pairs.extend(
            dates
                .into_iter()
                .filter_map(|(name, d)| d.map(|d| (name, d.format("%Y-%m-%d").to_string()))),
        );

        if let Some(n) = self.per_page {
            pairs.push(("per_page", n.to_string()));
        }
        if let Some(p) = self.page {
            pairs.push(("page", p.to_string()));
        }
        pairs
    }
}
