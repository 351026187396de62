//! Lenient conversions from spreadsheet cells to text and decimals

use bigdecimal::{BigDecimal, RoundingMode};
use serde_json::Value;
use std::str::FromStr;

/// Coerce a cell to text. `null` is absent; everything else has a text form.
pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Largest decimal scale, in either direction, a money cell may carry
const MAX_SCALE: i64 = 32;

/// Parse a money string, returning zero when it cannot be read.
///
/// Thousands separators, the rupee sign, `Rs.` prefixes and blanks are
/// stripped; accounting-style `(123.45)` reads as negative. Exponent forms
/// whose scale exceeds [`MAX_SCALE`] read as zero, since summing them would
/// never finish.
pub fn parse_decimal(raw: &str) -> BigDecimal {
    let mut text: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '₹')
        .collect();
    if let Some(rest) = text
        .strip_prefix("Rs.")
        .or_else(|| text.strip_prefix("INR"))
    {
        text = rest.to_string();
    }
    let negative = text.starts_with('(') && text.ends_with(')');
    if negative {
        text = text[1..text.len() - 1].to_string();
    }

    let value = match BigDecimal::from_str(&text) {
        Ok(value) => value,
        Err(_) => return BigDecimal::from(0),
    };
    let (_, scale) = value.as_bigint_and_exponent();
    if scale.abs() > MAX_SCALE {
        tracing::debug!(raw, scale, "amount out of range, reading as zero");
        return BigDecimal::from(0);
    }
    if negative {
        -value
    } else {
        value
    }
}

/// Read a numeric cell. Blank cells are absent, unreadable ones are zero.
pub fn value_to_amount(value: &Value) -> Option<BigDecimal> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(parse_decimal(s)),
        Value::Number(n) => Some(parse_decimal(&n.to_string())),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Some(BigDecimal::from(0)),
    }
}

/// Read a numeric cell, treating absence as zero
pub fn amount_or_zero(value: Option<&Value>) -> BigDecimal {
    value
        .and_then(value_to_amount)
        .unwrap_or_else(|| BigDecimal::from(0))
}

/// Round half-up to two decimal places
pub fn round2(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

/// Two-decimal float for JSON consumers that expect plain numbers
pub fn to_money_f64(amount: &BigDecimal) -> f64 {
    round2(amount).to_string().parse().unwrap_or(0.0)
}
