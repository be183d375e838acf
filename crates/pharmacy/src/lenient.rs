//! Permissive numeric/text decoding for server props.
//!
//! Absent or `null` numbers count as zero, decimal columns may arrive as
//! strings (`"12.50"`), nullable text columns collapse to an empty string and
//! nullable flags to `false`.
//! Negative quantities are still rejected: stock can never go below zero.

use serde::{Deserialize, Deserializer, de::Error as _};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberLike {
    Number(f64),
    Text(String),
}

fn parse_number<E: serde::de::Error>(raw: Option<NumberLike>) -> Result<Option<f64>, E> {
    match raw {
        None => Ok(None),
        Some(NumberLike::Number(n)) => Ok(Some(n)),
        Some(NumberLike::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>()
                .map(Some)
                .map_err(|e| E::custom(format!("invalid number {s:?}: {e}")))
        }
    }
}

/// Non-negative whole quantity; `null`/missing → 0.
pub fn quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = Option::<NumberLike>::deserialize(deserializer)?;
    match parse_number::<D::Error>(raw)? {
        None => Ok(0),
        Some(n) if !n.is_finite() || n.fract() != 0.0 => {
            Err(D::Error::custom(format!("quantity must be a whole number, got {n}")))
        }
        Some(n) if n < 0.0 => Err(D::Error::custom(format!("quantity cannot be negative, got {n}"))),
        Some(n) => Ok(n as u64),
    }
}

/// Monetary amount; `null`/missing → 0.0.
pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(option_amount(deserializer)?.unwrap_or(0.0))
}

/// Monetary amount that may legitimately be unset (e.g. a drug without a price).
pub fn option_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<NumberLike>::deserialize(deserializer)?;
    match parse_number::<D::Error>(raw)? {
        Some(n) if !n.is_finite() => Err(D::Error::custom("amount must be finite")),
        other => Ok(other),
    }
}

/// Nullable text column; `null`/missing → "".
pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Server-computed boolean; `null`/missing → `false`.
pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
