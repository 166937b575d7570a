//! Display formatting for currency, rates, counts and ROAS.
//!
//! Every helper accepts either a value or an `Option` and renders a missing
//! value as `N/A`.

/// Placeholder for missing values.
pub const NOT_AVAILABLE: &str = "N/A";

/// `$1,234.57` style currency with two decimals.
pub fn format_currency(value: impl Into<Option<f64>>) -> String {
    format_currency_with(value, "$")
}

/// Currency with a custom symbol.
pub fn format_currency_with(value: impl Into<Option<f64>>, symbol: &str) -> String {
    match value.into() {
        Some(v) if v.is_finite() => {
            let sign = if v < 0.0 { "-" } else { "" };
            format!("{sign}{symbol}{}", group_thousands(&format!("{:.2}", v.abs())))
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// A fraction rendered as a percentage, e.g. `0.0523` as `5.23%`.
pub fn format_percentage(value: impl Into<Option<f64>>) -> String {
    match value.into() {
        Some(v) if v.is_finite() => format!("{:.2}%", v * 100.0),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// A count rounded to a whole number with thousands separators.
pub fn format_number(value: impl Into<Option<f64>>) -> String {
    match value.into() {
        Some(v) if v.is_finite() => {
            let rounded = format!("{:.0}", v.abs());
            let sign = if v < 0.0 && rounded != "0" { "-" } else { "" };
            format!("{sign}{}", group_thousands(&rounded))
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// ROAS as a multiplier, e.g. `3.50x`.
pub fn format_roas(value: impl Into<Option<f64>>) -> String {
    match value.into() {
        Some(v) if v.is_finite() => format!("{v:.2}x"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Insert `,` every three digits of the integer part of an unsigned decimal.
fn group_thousands(digits: &str) -> String {
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{grouped}.{f}"),
        None => grouped,
    }
}
