/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use sales_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let abs_value = value.abs();

    // Nudge by a half ULP at the target precision so exact midpoints round up.
    let factor = 10_f64.powi(decimals as i32);
    let epsilon = f64::EPSILON * abs_value * factor;
    let rounded = ((abs_value * factor) + epsilon).round() / factor;

    let integer_part = rounded.trunc() as u64;
    let frac_part = rounded - rounded.trunc();
    let grouped = group_thousands(&integer_part.to_string());

    let result = if decimals == 0 {
        grouped
    } else {
        // `frac_str` starts with "0.", e.g. "0.50".
        let frac_str = format!("{:.prec$}", frac_part, prec = decimals as usize);
        format!("{}{}", grouped, &frac_str[1..])
    };

    // A value that rounds to zero is printed without a sign.
    if value < 0.0 && rounded != 0.0 {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a sale amount or order count as a whole number.
///
/// ```
/// use sales_core::formatting::format_amount;
///
/// assert_eq!(format_amount(12345.4), "12,345");
/// ```
pub fn format_amount(value: f64) -> String {
    format_number(value, 0)
}

/// Format a change with an explicit sign, e.g. `"+12,345"` or `"-500"`.
///
/// ```
/// use sales_core::formatting::format_signed_amount;
///
/// assert_eq!(format_signed_amount(50.0), "+50");
/// assert_eq!(format_signed_amount(-1500.0), "-1,500");
/// assert_eq!(format_signed_amount(0.0), "0");
/// ```
pub fn format_signed_amount(value: f64) -> String {
    let formatted = format_number(value, 0);
    if value > 0.0 && formatted != "0" {
        format!("+{}", formatted)
    } else {
        formatted
    }
}

/// Format a percentage change with one decimal and an explicit sign.
///
/// A rate that rounds to zero is printed unsigned.
///
/// ```
/// use sales_core::formatting::format_rate;
///
/// assert_eq!(format_rate(50.0), "+50.0%");
/// assert_eq!(format_rate(-100.0), "-100.0%");
/// assert_eq!(format_rate(-0.04), "0.0%");
/// ```
pub fn format_rate(rate: f64) -> String {
    let formatted = format_number(rate, 1);
    if rate > 0.0 && formatted != "0.0" {
        format!("+{}%", formatted)
    } else {
        format!("{}%", formatted)
    }
}

/// `(part / whole) * 100`, or `0.0` when `whole` is zero.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let remainder = digits.len() % 3;
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && i % 3 == remainder {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

// ── Tests ──────────────────────────────────────────────────────────────────────
