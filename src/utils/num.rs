// src/utils/num.rs

use serde_json::Value;

/// Parses a numeric answer the way the form emits them: a plain float,
/// possibly surrounded by whitespace. Empty or non-numeric input yields None.
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Lenient numeric extraction from catalog JSON: Airtable revisions send
/// coefficients and prices either as numbers or as numeric strings.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}
