//! en-US style number formatting for the derived display values

use crate::core::quote::CurrencyCode;

/// Display value for anything that cannot be computed (no rate, zero rate, bad input).
pub const NOT_AVAILABLE: &str = "not available";

/// Formats `value` with exactly `fraction_digits` decimals and comma grouping.
pub fn format_fixed(value: f64, fraction_digits: usize) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let (sign, body) = signed_parts(value, fraction_digits);
    format!("{sign}{body}")
}

/// Formats `value` as an amount of `code` with two decimals, e.g. `$1,234.50`.
pub fn format_currency(value: f64, code: CurrencyCode) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let (sign, body) = signed_parts(value, 2);
    format!("{sign}{}{body}", code.symbol())
}

/// Grouped decimal with up to three fraction digits and no trailing zeros.
pub fn format_grouped(value: f64) -> String {
    if !value.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    let (sign, body) = signed_parts(value, 3);
    let body = match body.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                int.to_string()
            } else {
                format!("{int}.{frac}")
            }
        }
        None => body,
    };
    format!("{sign}{body}")
}

fn signed_parts(value: f64, fraction_digits: usize) -> (&'static str, String) {
    let rounded = format!("{:.*}", fraction_digits, value.abs());
    let (int, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let is_zero = rounded.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    let grouped = group_thousands(int);
    let body = if frac.is_empty() {
        grouped
    } else {
        format!("{grouped}.{frac}")
    };
    (sign, body)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
