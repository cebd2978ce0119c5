//! Cell-level type coercion for CSV imports.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};

/// How a column's raw text is turned into a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Kept as text.
    Text,
    /// Parsed as a number and rounded.
    Integer,
    /// Parsed as a number; integral text stays integral.
    Number,
    /// Missing means `false`.
    Boolean,
    /// Normalized to `YYYY-MM-DD`.
    Date,
    /// Embedded JSON document.
    Json,
    /// Boolean, integer, float or text, whichever the cell looks like.
    Inferred,
}

const MISSING: &[&str] = &[
    "", "nan", "-nan", "na", "n/a", "#n/a", "<na>", "null", "none",
];

const FALSY: &[&str] = &["false", "f", "0", "0.0", "no", "n"];

/// Whether a cell counts as an empty value.
pub fn is_missing(raw: &str) -> bool {
    let trimmed = raw.trim();
    MISSING.iter().any(|m| trimmed.eq_ignore_ascii_case(m))
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Convert one raw CSV cell.
pub fn coerce_cell(raw: &str, kind: ColumnKind) -> Value {
    let trimmed = raw.trim();
    match kind {
        ColumnKind::Boolean => Value::Bool(parse_bool(raw)),
        _ if is_missing(raw) => Value::Null,
        ColumnKind::Text => Value::String(raw.to_string()),
        ColumnKind::Integer => parse_finite(trimmed)
            .map(|f| Value::from(f.round() as i64))
            .unwrap_or(Value::Null),
        ColumnKind::Number => parse_number(trimmed).unwrap_or(Value::Null),
        ColumnKind::Date => normalize_date(trimmed).map_or(Value::Null, Value::String),
        ColumnKind::Json => serde_json::from_str(trimmed).unwrap_or(Value::Null),
        ColumnKind::Inferred => infer(trimmed),
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Value::from(i));
    }
    parse_finite(raw).and_then(Number::from_f64).map(Value::Number)
}

/// Empty and the usual false spellings are `false`; any other text is `true`.
pub fn parse_bool(raw: &str) -> bool {
    if is_missing(raw) {
        return false;
    }
    let trimmed = raw.trim();
    !FALSY.iter().any(|f| trimmed.eq_ignore_ascii_case(f))
}

fn infer(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if !f.is_finite() {
            return Value::Null;
        }
    }
    parse_number(raw).unwrap_or_else(|| Value::String(raw.to_string()))
}

/// Normalize common date and timestamp spellings to `YYYY-MM-DD`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive().format("%Y-%m-%d").to_string());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date().format("%Y-%m-%d").to_string());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date.format("%Y-%m-%d").to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_and_non_finite_become_null() {
        assert_eq!(coerce_cell("", ColumnKind::Number), Value::Null);
        assert_eq!(coerce_cell("NaN", ColumnKind::Number), Value::Null);
        assert_eq!(coerce_cell("inf", ColumnKind::Number), Value::Null);
        assert_eq!(coerce_cell("-inf", ColumnKind::Integer), Value::Null);
        assert_eq!(coerce_cell("inf", ColumnKind::Inferred), Value::Null);
        assert_eq!(coerce_cell("nan", ColumnKind::Text), Value::Null);
    }

    #[test]
    fn test_integer_columns_round() {
        assert_eq!(coerce_cell("12.0", ColumnKind::Integer), json!(12));
        assert_eq!(coerce_cell("11.6", ColumnKind::Integer), json!(12));
        assert_eq!(coerce_cell("abc", ColumnKind::Integer), Value::Null);
    }

    #[test]
    fn test_number_keeps_integral_text_integral() {
        assert_eq!(coerce_cell("30", ColumnKind::Number), json!(30));
        assert_eq!(coerce_cell("0.512", ColumnKind::Number), json!(0.512));
        assert_eq!(coerce_cell("n/a", ColumnKind::Number), Value::Null);
        assert_eq!(coerce_cell("text", ColumnKind::Number), Value::Null);
    }

    #[test]
    fn test_boolean_defaults_false() {
        assert_eq!(coerce_cell("", ColumnKind::Boolean), json!(false));
        assert_eq!(coerce_cell("True", ColumnKind::Boolean), json!(true));
        assert_eq!(coerce_cell("False", ColumnKind::Boolean), json!(false));
        assert_eq!(coerce_cell("0", ColumnKind::Boolean), json!(false));
        assert_eq!(coerce_cell("1", ColumnKind::Boolean), json!(true));
    }

    #[test]
    fn test_dates_normalize() {
        assert_eq!(normalize_date("2024-11-04T23:30:00.000Z").as_deref(), Some("2024-11-04"));
        assert_eq!(normalize_date("2024-11-04 19:00:00").as_deref(), Some("2024-11-04"));
        assert_eq!(normalize_date("2024-11-04").as_deref(), Some("2024-11-04"));
        assert_eq!(normalize_date("11/04/2024").as_deref(), Some("2024-11-04"));
        assert_eq!(normalize_date("yesterday"), None);
        assert_eq!(coerce_cell("not a date", ColumnKind::Date), Value::Null);
    }

    #[test]
    fn test_json_cells() {
        assert_eq!(coerce_cell("[40, 38]", ColumnKind::Json), json!([40, 38]));
        assert_eq!(coerce_cell("[40, 38", ColumnKind::Json), Value::Null);
    }

    #[test]
    fn test_inferred_cells() {
        assert_eq!(coerce_cell("401", ColumnKind::Inferred), json!(401));
        assert_eq!(coerce_cell("1.5", ColumnKind::Inferred), json!(1.5));
        assert_eq!(coerce_cell("True", ColumnKind::Inferred), json!(true));
        assert_eq!(coerce_cell("final", ColumnKind::Inferred), json!("final"));
        assert_eq!(coerce_cell("  ", ColumnKind::Inferred), Value::Null);
    }
}
