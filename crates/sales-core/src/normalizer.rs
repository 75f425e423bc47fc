//! Best-effort coercion of raw sale amounts into numbers.
//!
//! Exports commonly write amounts as `"12,345"` or wrap them in parentheses
//! (`"(12,345)"`). The first run of digits and thousands separators is taken
//! as the amount; anything that still fails to parse becomes `0.0`.
//! [`parse_amount`] exposes the failure for callers that audit data quality.

use std::sync::OnceLock;

use regex::Regex;

use crate::models::RawAmount;

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(?([0-9,]+)\)?").expect("regex is valid"))
}

/// Parse a textual amount, returning `None` when it is not numeric.
///
/// # Examples
///
/// ```
/// use sales_core::normalizer::parse_amount_text;
///
/// assert_eq!(parse_amount_text("(1,000)"), Some(1000.0));
/// assert_eq!(parse_amount_text("N/A"), None);
/// ```
pub fn parse_amount_text(raw: &str) -> Option<f64> {
    let candidate = amount_pattern()
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    let cleaned = candidate.replace(',', "");
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parse any raw amount. Numeric cells pass through unchanged.
pub fn parse_amount(raw: &RawAmount) -> Option<f64> {
    match raw {
        RawAmount::Number(value) => Some(*value).filter(|v| v.is_finite()),
        RawAmount::Text(text) => parse_amount_text(text),
    }
}

/// Normalise a raw amount, falling back to `0.0` when it is unparseable.
///
/// # Examples
///
/// ```
/// use sales_core::models::RawAmount;
/// use sales_core::normalizer::normalize_amount;
///
/// assert_eq!(normalize_amount(&RawAmount::from("12,345")), 12345.0);
/// assert_eq!(normalize_amount(&RawAmount::from("")), 0.0);
/// ```
pub fn normalize_amount(raw: &RawAmount) -> f64 {
    parse_amount(raw).unwrap_or(0.0)
}
