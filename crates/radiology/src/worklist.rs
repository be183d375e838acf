//! Radiology worklist: status filter, ordering and header counts.

use serde::{Deserialize, Serialize};

use hmis_core::{DomainError, DomainResult};

use crate::order::{ImagingOrder, OrderStatus};

/// `status` query value of the worklist.
///
/// The worklist opens on `pending` (ordered or in progress).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    Pending,
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn parse(value: &str) -> DomainResult<Self> {
        match value {
            "pending" => Ok(StatusFilter::Pending),
            "all" => Ok(StatusFilter::All),
            other => other
                .parse::<OrderStatus>()
                .map(StatusFilter::Only)
                .map_err(|_| DomainError::validation(format!("unknown status filter: {other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::Pending => "pending",
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.as_str(),
        }
    }

    pub fn matches(self, status: OrderStatus) -> bool {
        match self {
            StatusFilter::Pending => status.is_pending(),
            StatusFilter::All => true,
            StatusFilter::Only(s) => s == status,
        }
    }
}

/// Worklist order: priority rank first, then oldest order first.
/// Orders without an order time sort last within their priority.
pub fn sort_worklist(orders: &mut [ImagingOrder]) {
    orders.sort_by(|a, b| {
        a.priority()
            .rank()
            .cmp(&b.priority().rank())
            .then_with(|| match (a.ordered_at(), b.ordered_at()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => core::cmp::Ordering::Less,
                (None, Some(_)) => core::cmp::Ordering::Greater,
                (None, None) => core::cmp::Ordering::Equal,
            })
    });
}

/// Header counts as sent in the worklist's `stats` prop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorklistStats {
    #[serde(default)]
    pub ordered: u64,
    #[serde(default)]
    pub in_progress: u64,
    #[serde(default)]
    pub completed_today: u64,
}

impl WorklistStats {
    pub fn pending(&self) -> u64 {
        self.ordered + self.in_progress
    }
}
