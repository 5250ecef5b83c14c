//! Numeric reading of attribute values.
//!
//! Attribute totals (price, weight, points) are summed as decimals so that
//! `19.99 * 3` stays `59.97`.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;

/// Read an attribute value as a decimal amount.
///
/// Numbers and numeric strings yield their value, `true` yields one.
/// Everything else has no amount.
///
/// ## Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use serde_json::json;
/// use session_cart_core::attribute_amount;
///
/// assert_eq!(attribute_amount(&json!(19.99)), Some(Decimal::new(1999, 2)));
/// assert_eq!(attribute_amount(&json!("5")), Some(Decimal::from(5)));
/// assert_eq!(attribute_amount(&json!("n/a")), None);
/// ```
#[must_use]
pub fn attribute_amount(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        Value::Bool(true) => Some(Decimal::ONE),
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_numbers() {
        assert_eq!(attribute_amount(&json!(10)), Some(Decimal::from(10)));
        assert_eq!(attribute_amount(&json!(-2)), Some(Decimal::from(-2)));
        assert_eq!(attribute_amount(&json!(0.5)), Some(Decimal::new(5, 1)));
    }

    #[test]
    fn test_strings() {
        assert_eq!(attribute_amount(&json!(" 4.25 ")), Some(Decimal::new(425, 2)));
        assert_eq!(attribute_amount(&json!("1e3")), Some(Decimal::from(1000)));
        assert_eq!(attribute_amount(&json!("")), None);
        assert_eq!(attribute_amount(&json!("abc")), None);
    }

    #[test]
    fn test_other_values() {
        assert_eq!(attribute_amount(&json!(true)), Some(Decimal::ONE));
        assert_eq!(attribute_amount(&json!(false)), None);
        assert_eq!(attribute_amount(&json!(null)), None);
        assert_eq!(attribute_amount(&json!([1, 2])), None);
    }
}
