//! Decimal money helpers
//!
//! All monetary accumulation in the GL pipeline happens in [`Decimal`] to
//! avoid floating-point drift across thousands of transaction rows; this
//! mirrors the teacher's `order_money` module, which keeps currency math in
//! `rust_decimal` and only ever formats to strings at the output boundary.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use std::fmt::Write as _;

/// Two decimal places, half-up rounding — the precision every monetary
/// value in a rendered GL row or rollup carries (spec §3.1 `StoreTotals`).
pub const MONEY_SCALE: u32 = 2;

/// Round a decimal to [`MONEY_SCALE`] places using banker-free half-up
/// rounding, matching accounting conventions.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Format a decimal with an `en-US` thousands separator and exactly two
/// decimal places, e.g. `1234.5` -> `"1,234.50"`, `-3` -> `"-3.00"`.
pub fn format_money(value: Decimal) -> String {
    let value = round_money(value);
    let negative = value.is_sign_negative();
    let abs = value.abs();
    let scaled = abs.round_dp(MONEY_SCALE);
    let s = scaled.to_string();
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s.as_str(), ""),
    };
    let frac = format!("{:0<width$}", frac_part, width = MONEY_SCALE as usize);

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let grouped: String = grouped.chars().rev().collect();

    let mut out = String::with_capacity(grouped.len() + frac.len() + 2);
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    let _ = write!(out, ".{frac}");
    out
}

/// Parse a currency string of the form `"$1,234.56"`, `"1234.56"`, or a bare
/// number into a [`Decimal`]. Used by the CSV/JSON tabular import path
/// (spec §4.4), whose upstream export tool formats amounts inconsistently.
pub fn parse_currency(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn formats_thousands_separator() {
        assert_eq!(format_money(dec!(1234.5)), "1,234.50");
        assert_eq!(format_money(dec!(108)), "108.00");
        assert_eq!(format_money(dec!(1000000)), "1,000,000.00");
    }

    #[test]
    fn formats_negative_values() {
        assert_eq!(format_money(dec!(-42.1)), "-42.10");
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(round_money(dec!(1.005)), dec!(1.01));
    }

    #[test]
    fn parses_dollar_and_comma_formatted_strings() {
        assert_eq!(parse_currency("$1,234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_currency("1234.56"), Some(dec!(1234.56)));
        assert_eq!(parse_currency("-45.00"), Some(dec!(-45.00)));
        assert_eq!(parse_currency(""), None);
    }
}
