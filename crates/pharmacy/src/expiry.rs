//! Expiry classification for drug batches.
//!
//! `days_until_expiry = ceil((expiry − now) / 1 day)` on the full timestamp
//! difference. Times are not normalized to midnight first, so a batch that
//! expires later today counts as day 0 or 1 depending on the hour; this
//! matches what the screens have always shown.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hmis_core::ValueObject;

use crate::bucket::Bucket;
use crate::model::{DrugBatch, InventoryDrug};

/// Upper bound (inclusive) of the `expires_soon` bucket, in days.
pub const EXPIRES_SOON_DAYS: i64 = 7;
/// Upper bound (inclusive) of the `expiring` bucket, in days.
pub const EXPIRING_DAYS: i64 = 30;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Whole days until expiry, rounded up. Negative once the batch has expired.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaysUntilExpiry(i64);

impl ValueObject for DaysUntilExpiry {}

impl DaysUntilExpiry {
    pub const fn new(days: i64) -> Self {
        Self(days)
    }

    /// Days between `now` and `expiry`, rounded towards +∞.
    pub fn between(expiry: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let diff = (expiry - now).num_milliseconds();
        // Integer division truncates towards zero, which is already the
        // ceiling for negative differences.
        let days = diff / MILLIS_PER_DAY;
        if diff % MILLIS_PER_DAY > 0 {
            Self(days + 1)
        } else {
            Self(days)
        }
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Relative label: `"N days ago"`, `"Today"`, `"Tomorrow"` or `"N days"`.
    pub fn relative_label(self) -> String {
        match self.0 {
            d if d < 0 => format!("{} days ago", d.unsigned_abs()),
            0 => "Today".to_string(),
            1 => "Tomorrow".to_string(),
            d => format!("{d} days"),
        }
    }

    pub fn bucket(self) -> ExpiryBucket {
        ExpiryBucket::from_days(self)
    }
}

impl fmt::Display for DaysUntilExpiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_label())
    }
}

/// Derived expiry risk category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryBucket {
    Expired,
    ExpiresSoon,
    Expiring,
    Stable,
}

impl ValueObject for ExpiryBucket {}

impl ExpiryBucket {
    /// First match wins: `< 0`, `≤ 7`, `≤ 30`, otherwise stable.
    pub fn from_days(days: DaysUntilExpiry) -> Self {
        match days.get() {
            d if d < 0 => Self::Expired,
            d if d <= EXPIRES_SOON_DAYS => Self::ExpiresSoon,
            d if d <= EXPIRING_DAYS => Self::Expiring,
            _ => Self::Stable,
        }
    }

    pub fn priority(self) -> ActionPriority {
        match self {
            Self::Expired => ActionPriority::Urgent,
            Self::ExpiresSoon => ActionPriority::High,
            Self::Expiring => ActionPriority::Medium,
            Self::Stable => ActionPriority::Low,
        }
    }
}

impl Bucket for ExpiryBucket {
    const ALL: &'static [Self] = &[Self::Expired, Self::ExpiresSoon, Self::Expiring, Self::Stable];

    fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::ExpiresSoon => "expires_soon",
            Self::Expiring => "expiring",
            Self::Stable => "stable",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Expired => "Expired",
            Self::ExpiresSoon => "Expires Soon",
            Self::Expiring => "Expiring",
            Self::Stable => "Stable",
        }
    }
}

/// How urgently a bucket needs attention.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority {
    Urgent,
    High,
    Medium,
    Low,
}

impl ActionPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Full classification result for one expiry date.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryStatus {
    pub days: DaysUntilExpiry,
    pub bucket: ExpiryBucket,
}

impl ValueObject for ExpiryStatus {}

impl ExpiryStatus {
    pub fn relative_label(&self) -> String {
        self.days.relative_label()
    }

    pub fn priority(&self) -> ActionPriority {
        self.bucket.priority()
    }
}

/// Classify an expiry instant relative to `now`.
pub fn classify_expiry(expiry: DateTime<Utc>, now: DateTime<Utc>) -> ExpiryStatus {
    let days = DaysUntilExpiry::between(expiry, now);
    ExpiryStatus {
        days,
        bucket: days.bucket(),
    }
}

impl DrugBatch {
    pub fn expiry_status(&self, now: DateTime<Utc>) -> ExpiryStatus {
        classify_expiry(self.expiry_date, now)
    }

    pub fn expiry_bucket(&self, now: DateTime<Utc>) -> ExpiryBucket {
        self.expiry_status(now).bucket
    }
}

impl InventoryDrug {
    /// Whether the earliest available batch expires within `days` (and has
    /// not already expired). Drugs without batches never qualify.
    pub fn next_expiry_within(&self, now: DateTime<Utc>, days: i64) -> bool {
        self.next_expiry
            .map(|expiry| {
                let d = DaysUntilExpiry::between(expiry, now).get();
                (0..=days).contains(&d)
            })
            .unwrap_or(false)
    }

    /// Inventory-row highlight: next expiry within the `expiring` window.
    pub fn is_expiring_soon(&self, now: DateTime<Utc>) -> bool {
        self.next_expiry_within(now, EXPIRING_DAYS)
    }
}
