//! Raw occurrence rows and tolerant value accessors.

use serde_json::{Map, Value};
use std::borrow::Cow;

/// One untyped input row: column name → value.
pub type RawRow = Map<String, Value>;

/// Text form of a scalar cell; `None` for null, empty strings and containers.
pub fn cell_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then_some(Cow::Borrowed(trimmed))
        }
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Numeric form of a cell. Numeric strings are parsed; the result may be
/// non-finite (`"NaN"`, `"inf"`).
pub fn cell_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Whole-number form of a cell; accepts `2024`, `"2024"` and `2024.0`.
pub fn cell_integer(value: &Value) -> Option<i64> {
    let number = cell_number(value)?;
    (number.is_finite() && number.fract() == 0.0).then_some(number as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("  US ")).as_deref(), Some("US"));
        assert_eq!(cell_text(&json!(12.5)).as_deref(), Some("12.5"));
        assert_eq!(cell_text(&json!(true)).as_deref(), Some("true"));
        assert!(cell_text(&json!("   ")).is_none());
        assert!(cell_text(&json!(null)).is_none());
        assert!(cell_text(&json!({ "a": 1 })).is_none());
    }

    #[test]
    fn test_cell_number() {
        assert_eq!(cell_number(&json!(32.0)), Some(32.0));
        assert_eq!(cell_number(&json!(" -110.25 ")), Some(-110.25));
        assert!(cell_number(&json!("NaN")).unwrap().is_nan());
        assert!(cell_number(&json!("n/a")).is_none());
        assert!(cell_number(&json!([1])).is_none());
    }

    #[test]
    fn test_cell_integer() {
        assert_eq!(cell_integer(&json!(2024)), Some(2024));
        assert_eq!(cell_integer(&json!("2024")), Some(2024));
        assert_eq!(cell_integer(&json!(2024.0)), Some(2024));
        assert_eq!(cell_integer(&json!(2024.5)), None);
        assert_eq!(cell_integer(&json!("")), None);
    }
}
