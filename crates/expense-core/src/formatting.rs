use std::fmt::Write;

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Format a decimal with thousands separators and a fixed number of decimal
/// places. Rounding is banker's rounding, the same as percentage rounding.
///
/// # Examples
///
/// ```
/// use expense_core::formatting::format_number;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_number(Decimal::new(12345, 1), 1), "1,234.5");
/// assert_eq!(format_number(Decimal::new(1234567, 0), 0), "1,234,567");
/// assert_eq!(format_number(Decimal::ZERO, 2), "0.00");
/// assert_eq!(format_number(Decimal::new(-98765, 1), 1), "-9,876.5");
/// ```
pub fn format_number(value: Decimal, decimals: u32) -> String {
    let rounded = value.round_dp(decimals);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();

    // `{:.N}` pads short fractions with zeros.
    let text = format!("{:.*}", decimals as usize, rounded.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let grouped = group_thousands(int_part);
    let result = match frac_part {
        Some(f) if decimals > 0 => format!("{}.{}", grouped, f),
        _ => grouped,
    };

    if negative {
        format!("-{}", result)
    } else {
        result
    }
}

/// Format a monetary amount with a currency symbol, thousands separators and
/// `decimals` places.
///
/// # Examples
///
/// ```
/// use expense_core::formatting::format_currency;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_currency(Decimal::new(123456, 2), "$", 2), "$1,234.56");
/// assert_eq!(format_currency(Decimal::ZERO, "$", 2), "$0.00");
/// assert_eq!(format_currency(Decimal::new(-999, 2), "$", 2), "$-9.99");
/// ```
pub fn format_currency(amount: Decimal, symbol: &str, decimals: u32) -> String {
    format!("{}{}", symbol, format_number(amount, decimals))
}

/// Format a percentage value (already scaled to 0–100) with a `%` suffix.
pub fn format_percentage(value: Decimal, decimals: u32) -> String {
    format!("{}%", format_number(value, decimals))
}

/// Format a date with a strftime pattern. Patterns that need time-of-day
/// fields fall back to ISO `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(pattern)).is_err() {
        return date.to_string();
    }
    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────
