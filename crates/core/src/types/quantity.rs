//! Quantity literals.
//!
//! Hosts pass quantities straight from forms, query strings and JSON bodies,
//! so the cart accepts them loosely and resolves them with one rule: a
//! non-negative integer literal is taken as-is, anything else becomes 1.

use serde_json::Value;

/// Quantity used when the supplied literal is not a non-negative integer.
pub const FALLBACK_QUANTITY: u64 = 1;

/// A quantity exactly as the caller supplied it.
///
/// ## Examples
///
/// ```
/// use session_cart_core::RawQuantity;
///
/// assert_eq!(RawQuantity::from(3).resolve(), 3);
/// assert_eq!(RawQuantity::from("12").resolve(), 12);
/// assert_eq!(RawQuantity::from(-3).resolve(), 1);
/// assert_eq!(RawQuantity::from("abc").resolve(), 1);
/// assert_eq!(RawQuantity::from(2.5).resolve(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RawQuantity {
    /// Signed integer input.
    Integer(i128),
    /// Floating point input. Whole, non-negative values are accepted.
    Float(f64),
    /// Text input. Only ASCII digits are accepted.
    Text(String),
    /// Input with no quantity meaning (`null`, arrays, objects).
    Invalid,
}

impl RawQuantity {
    /// Returns the quantity if the input is a non-negative integer literal.
    ///
    /// Digit strings beyond `u64::MAX` saturate.
    #[must_use]
    pub fn literal(&self) -> Option<u64> {
        match self {
            Self::Integer(n) => u64::try_from(*n).ok(),
            Self::Float(f) => whole_float(*f),
            Self::Text(s) => digits(s),
            Self::Invalid => None,
        }
    }

    /// Resolves the input, falling back to [`FALLBACK_QUANTITY`].
    #[must_use]
    pub fn resolve(&self) -> u64 {
        self.literal().unwrap_or(FALLBACK_QUANTITY)
    }
}

impl Default for RawQuantity {
    fn default() -> Self {
        Self::Integer(i128::from(FALLBACK_QUANTITY))
    }
}

fn digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse::<u64>().unwrap_or(u64::MAX))
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)] // range and fraction are checked before the cast
fn whole_float(f: f64) -> Option<u64> {
    if !f.is_finite() || f < 0.0 || f.fract() != 0.0 {
        return None;
    }
    if f >= u64::MAX as f64 {
        return Some(u64::MAX);
    }
    Some(f as u64)
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RawQuantity {
                fn from(n: $ty) -> Self {
                    Self::Integer(i128::from(n))
                }
            }
        )*
    };
}

impl_from_integer!(u8, u16, u32, u64, i8, i16, i32, i64);

impl From<usize> for RawQuantity {
    fn from(n: usize) -> Self {
        i128::try_from(n).map_or(Self::Invalid, Self::Integer)
    }
}

impl From<f64> for RawQuantity {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for RawQuantity {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for RawQuantity {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&Value> for RawQuantity {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(i128::from)
                .or_else(|| n.as_i64().map(i128::from))
                .map_or_else(|| n.as_f64().map_or(Self::Invalid, Self::Float), Self::Integer),
            Value::String(s) => Self::Text(s.clone()),
            Value::Bool(true) => Self::Integer(1),
            Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => Self::Invalid,
        }
    }
}

impl From<Value> for RawQuantity {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

impl From<Option<Value>> for RawQuantity {
    fn from(value: Option<Value>) -> Self {
        value.map_or_else(Self::default, Self::from)
    }
}

/// Clamps a quantity to the per-line maximum.
#[must_use]
pub fn clamp_quantity(quantity: u64, item_max_quantity: u64) -> u64 {
    quantity.min(item_max_quantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_integer_literals() {
        assert_eq!(RawQuantity::from(0).literal(), Some(0));
        assert_eq!(RawQuantity::from(7_u32).literal(), Some(7));
        assert_eq!(RawQuantity::from(-3).literal(), None);
        assert_eq!(RawQuantity::from(-3).resolve(), 1);
    }

    #[test]
    fn test_text_literals() {
        assert_eq!(RawQuantity::from("0").literal(), Some(0));
        assert_eq!(RawQuantity::from("007").literal(), Some(7));
        assert_eq!(RawQuantity::from("").literal(), None);
        assert_eq!(RawQuantity::from(" 5").literal(), None);
        assert_eq!(RawQuantity::from("-3").literal(), None);
        assert_eq!(RawQuantity::from("1.5").literal(), None);
        assert_eq!(RawQuantity::from("abc").resolve(), 1);
    }

    #[test]
    fn test_text_overflow_saturates() {
        let huge = "9".repeat(40);
        assert_eq!(RawQuantity::from(huge).literal(), Some(u64::MAX));
    }

    #[test]
    fn test_float_literals() {
        assert_eq!(RawQuantity::from(3.0).literal(), Some(3));
        assert_eq!(RawQuantity::from(2.5).literal(), None);
        assert_eq!(RawQuantity::from(-1.0).literal(), None);
        assert_eq!(RawQuantity::from(f64::NAN).literal(), None);
    }

    #[test]
    fn test_json_values() {
        assert_eq!(RawQuantity::from(&json!(4)).resolve(), 4);
        assert_eq!(RawQuantity::from(&json!("4")).resolve(), 4);
        assert_eq!(RawQuantity::from(&json!(-4)).resolve(), 1);
        assert_eq!(RawQuantity::from(&json!(4.5)).resolve(), 1);
        assert_eq!(RawQuantity::from(&json!(null)).resolve(), 1);
        assert_eq!(RawQuantity::from(&json!([1])).resolve(), 1);
        assert_eq!(RawQuantity::from(None).resolve(), 1);
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(15, 10), 10);
        assert_eq!(clamp_quantity(5, 10), 5);
    }
}
