//! Display formatting for monetary amounts.
//!
//! Amounts are rendered the way an en-US locale prints currency: symbol
//! first, comma thousands separators and the currency's minor-unit digits.
//! The sign always leads (`-$42.50`), never parentheses.
//!
//! Any three-letter code is accepted. Minor units come from the ISO 4217
//! registry; codes without an en-US symbol print as the code and a
//! non-breaking space (`RUB 5.00`).

use iso_currency::Currency;
use num_format::{Locale, ToFormattedString};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("malformed currency code {0:?}")]
    InvalidCode(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencySpec {
    pub code: String,
    pub prefix: String,
    pub decimals: u32,
}

/// en-US symbols; every other code prints as `CODE\u{a0}`.
const SYMBOLS: &[(&str, &str)] = &[
    ("USD", "$"),
    ("CAD", "CA$"),
    ("AUD", "A$"),
    ("NZD", "NZ$"),
    ("MXN", "MX$"),
    ("HKD", "HK$"),
    ("TWD", "NT$"),
    ("BRL", "R$"),
    ("XCD", "EC$"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("INR", "₹"),
    ("ILS", "₪"),
    ("PHP", "₱"),
    ("CNY", "CN¥"),
    ("JPY", "¥"),
    ("KRW", "₩"),
    ("VND", "₫"),
];

const DEFAULT_DECIMALS: u32 = 2;

/// Resolves a currency code, ignoring case. Fails unless it is three ASCII letters.
pub fn currency_spec(code: &str) -> Result<CurrencySpec, CurrencyError> {
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(CurrencyError::InvalidCode(code.to_string()));
    }
    let code = code.to_ascii_uppercase();

    let decimals = Currency::from_code(&code)
        .and_then(|c| c.exponent())
        .map_or(DEFAULT_DECIMALS, u32::from);
    let prefix = SYMBOLS
        .iter()
        .find(|(c, _)| *c == code)
        .map_or_else(|| format!("{code}\u{a0}"), |(_, symbol)| symbol.to_string());

    Ok(CurrencySpec {
        code,
        prefix,
        decimals,
    })
}

/// Formats `amount`, failing on a malformed currency code.
pub fn try_format_currency(amount: f64, code: &str) -> Result<String, CurrencyError> {
    let spec = currency_spec(code)?;
    let (sign, magnitude) = split_sign(amount);
    let rounded = round(shortest_decimal(magnitude), spec.decimals);
    Ok(format!("{sign}{}{}", spec.prefix, grouped(rounded, spec.decimals)))
}

/// Formats `amount`; malformed codes fall back to `$` with two fixed
/// decimals and no grouping.
pub fn format_currency(amount: f64, code: &str) -> String {
    try_format_currency(amount, code).unwrap_or_else(|err| {
        debug!(%err, "falling back to plain dollar formatting");
        let (sign, magnitude) = split_sign(amount);
        // the fallback rounds the exact binary value, so 1.005 stays 1.00
        let exact = Decimal::from_f64_retain(magnitude).unwrap_or(Decimal::MAX);
        format!("{sign}${:.2}", round(exact, 2))
    })
}

fn split_sign(amount: f64) -> (&'static str, f64) {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let sign = if amount < 0.0 { "-" } else { "" };
    (sign, amount.abs())
}

/// The decimal a reader sees for `magnitude`: `1.005` is taken as written,
/// not as its binary approximation.
fn shortest_decimal(magnitude: f64) -> Decimal {
    Decimal::from_str(&magnitude.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(magnitude))
        .unwrap_or(Decimal::MAX)
}

fn round(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

fn grouped(rounded: Decimal, decimals: u32) -> String {
    let text = format!("{rounded:.prec$}", prec = decimals as usize);
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };
    let whole = whole.parse::<u128>().unwrap_or_default().to_formatted_string(&Locale::en);
    match fraction {
        Some(fraction) => format!("{whole}.{fraction}"),
        None => whole,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_amounts_lead_with_minus() {
        assert_eq!(format_currency(-42.5, "USD"), "-$42.50");
        assert_eq!(format_currency(42.5, "USD"), "$42.50");
        assert_eq!(format_currency(-0.0, "USD"), "$0.00");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_currency(1_234_567.891, "USD"), "$1,234,567.89");
        assert_eq!(format_currency(999.999, "USD"), "$1,000.00");
        assert_eq!(format_currency(100.0, "USD"), "$100.00");
        assert_eq!(format_currency(-1210.0, "EUR"), "-€1,210.00");
    }

    #[test]
    fn respects_minor_units_and_case() {
        assert_eq!(format_currency(1234.5, "JPY"), "¥1,235");
        assert_eq!(format_currency(12.0, "gbp"), "£12.00");
        assert_eq!(format_currency(12.0, "CHF"), "CHF\u{a0}12.00");
        assert_eq!(format_currency(5.0, "CAD"), "CA$5.00");
        assert_eq!(format_currency(1.2345, "KWD"), "KWD\u{a0}1.235");
    }

    #[test]
    fn registry_codes_without_symbols_print_the_code() {
        assert_eq!(format_currency(5.0, "RUB"), "RUB\u{a0}5.00");
        assert_eq!(format_currency(1500.0, "thb"), "THB\u{a0}1,500.00");
        assert_eq!(format_currency(-5.0, "ISK"), "-ISK\u{a0}5");
    }

    #[test]
    fn well_formed_codes_outside_the_registry_use_two_decimals() {
        assert_eq!(format_currency(5.0, "XYZ"), "XYZ\u{a0}5.00");
        assert_eq!(
            currency_spec("xyz").unwrap(),
            CurrencySpec {
                code: "XYZ".into(),
                prefix: "XYZ\u{a0}".into(),
                decimals: 2
            }
        );
    }

    #[test]
    fn rounds_the_written_decimal_half_away_from_zero() {
        assert_eq!(format_currency(1.005, "USD"), "$1.01");
        assert_eq!(format_currency(2.675, "USD"), "$2.68");
        assert_eq!(format_currency(-1.005, "EUR"), "-€1.01");
        assert_eq!(format_currency(0.5, "JPY"), "¥1");
        assert_eq!(format_currency(-2.5, "KRW"), "-₩3");
    }

    #[test]
    fn fallback_rounds_exact_ties_upward() {
        assert_eq!(format_currency(0.125, "DOGE"), "$0.13");
        assert_eq!(format_currency(2.5, "DOGE"), "$2.50");
        // 1.005 and 2.675 sit just below the tie in binary
        assert_eq!(format_currency(1.005, "DOGE"), "$1.00");
        assert_eq!(format_currency(2.675, "DOGE"), "$2.67");
    }

    #[test]
    fn malformed_codes_fall_back_to_dollars() {
        assert_eq!(
            try_format_currency(1.0, "DOGE"),
            Err(CurrencyError::InvalidCode("DOGE".into()))
        );
        assert!(try_format_currency(1.0, "U$D").is_err());
        assert!(try_format_currency(1.0, " USD").is_err());
        assert_eq!(format_currency(1234.5, "DOGE"), "$1234.50");
        assert_eq!(format_currency(-42.5, ""), "-$42.50");
    }

    #[test]
    fn non_finite_amounts_print_as_zero() {
        assert_eq!(format_currency(f64::NAN, "USD"), "$0.00");
        assert_eq!(format_currency(f64::INFINITY, "XYZ"), "XYZ\u{a0}0.00");
        assert_eq!(format_currency(f64::NEG_INFINITY, "DOGE"), "$0.00");
    }
}
