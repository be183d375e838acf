//! Exhaustive, mutually exclusive classification buckets.

use core::hash::Hash;

use hmis_core::ValueObject;

/// A closed set of categories every classified item falls into exactly once.
pub trait Bucket: ValueObject + Copy + Eq + Ord + Hash + 'static {
    /// Every bucket, in display order.
    const ALL: &'static [Self];

    /// Stable machine name (matches the server's query-string values).
    fn as_str(self) -> &'static str;

    /// Human-readable badge label.
    fn label(self) -> &'static str;
}
