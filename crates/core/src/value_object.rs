//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects have **no identity**: two instances with the same attribute
/// values are interchangeable. Classification buckets, derived statuses and
/// parsed report sections are all value objects.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct DaysUntilExpiry(i64);
///
/// impl ValueObject for DaysUntilExpiry {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
