//! Forgiving decoders for numeric record fields.
//!
//! Journal and trade records are written by other parts of the application and
//! are not guaranteed to be well formed. A dashboard should still render, so a
//! missing, `null` or non-numeric value decodes to zero instead of failing the
//! whole record. Use together with `#[serde(default)]` so absent fields are covered:
//!
//! ```ignore
//! #[derive(Deserialize)]
//! struct Row {
//!     #[serde(default, deserialize_with = "lenient::decimal_or_zero")]
//!     pnl: Decimal,
//! }
//! ```

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use std::str::FromStr;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Decodes a signed decimal amount, falling back to zero.
pub fn decimal_or_zero<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decimal_from_value(&value))
}

/// Decodes a non-negative count, falling back to zero.
pub fn count_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count_from_value(&value))
}

pub fn decimal_from_value(value: &Value) -> Decimal {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => Decimal::ZERO,
    }
}

pub fn count_from_value(value: &Value) -> u32 {
    let decimal = decimal_from_value(value);
    if decimal.is_sign_negative() {
        return 0;
    }
    decimal.trunc().to_u32().unwrap_or(u32::MAX)
}

/// Clamps a count read from a signed database column.
pub fn count_from_i64(raw: Option<i64>) -> u32 {
    match raw {
        Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
        _ => 0,
    }
}

fn parse_decimal(raw: &str) -> Decimal {
    let raw = raw.trim();
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(Decimal::from_f64))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn decimals_accept_numbers_and_numeric_strings() {
        assert_eq!(decimal_from_value(&json!(12.5)), dec!(12.5));
        assert_eq!(decimal_from_value(&json!(-40)), dec!(-40));
        assert_eq!(decimal_from_value(&json!(" 99.10 ")), dec!(99.10));
        assert_eq!(decimal_from_value(&json!("1e3")), dec!(1000));
    }

    #[test]
    fn garbage_decodes_to_zero() {
        assert_eq!(decimal_from_value(&json!(null)), Decimal::ZERO);
        assert_eq!(decimal_from_value(&json!("n/a")), Decimal::ZERO);
        assert_eq!(decimal_from_value(&json!("NaN")), Decimal::ZERO);
        assert_eq!(decimal_from_value(&json!([1, 2])), Decimal::ZERO);
        assert_eq!(decimal_from_value(&json!({"v": 1})), Decimal::ZERO);
    }

    #[test]
    fn counts_are_clamped_to_non_negative_integers() {
        assert_eq!(count_from_value(&json!(3)), 3);
        assert_eq!(count_from_value(&json!("7")), 7);
        assert_eq!(count_from_value(&json!(2.9)), 2);
        assert_eq!(count_from_value(&json!(-4)), 0);
        assert_eq!(count_from_value(&json!(true)), 0);
        assert_eq!(count_from_i64(Some(-1)), 0);
        assert_eq!(count_from_i64(None), 0);
        assert_eq!(count_from_i64(Some(12)), 12);
    }
}
