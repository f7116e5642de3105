//! Display formatters.
//!
//! Everything here converts canonical values (digit strings, decimals) into the
//! strings a presentation layer shows. None of it is used for validation or on
//! the wire, which always carry the raw canonical value.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::card::CardBrand;
use crate::error::WizardError;

type BrandPattern = (fn(&str) -> bool, CardBrand);

/// Brand prefix rules, highest priority first.
const BRAND_PATTERNS: [BrandPattern; 6] = [
    (is_visa, CardBrand::Visa),
    (is_mastercard, CardBrand::Mastercard),
    (is_amex, CardBrand::Amex),
    (is_discover, CardBrand::Discover),
    (is_diners, CardBrand::Diners),
    (is_jcb, CardBrand::Jcb),
];

fn is_visa(d: &str) -> bool {
    d.starts_with('4')
}

fn is_mastercard(d: &str) -> bool {
    prefix_in(d, 2, 51, 55) || prefix_in(d, 2, 22, 27)
}

fn is_amex(d: &str) -> bool {
    d.starts_with("34") || d.starts_with("37")
}

fn is_discover(d: &str) -> bool {
    d.starts_with("6011") || d.starts_with("65")
}

fn is_diners(d: &str) -> bool {
    prefix_in(d, 3, 300, 305) || d.starts_with("36") || d.starts_with("38")
}

fn is_jcb(d: &str) -> bool {
    d.starts_with("35")
}

fn prefix_in(digits: &str, len: usize, low: u32, high: u32) -> bool {
    digits
        .get(..len)
        .and_then(|p| p.parse::<u32>().ok())
        .is_some_and(|p| (low..=high).contains(&p))
}

/// Classifies a card number by its leading digits. Total: anything that
/// matches no pattern is `Unknown`.
pub fn detect_card_brand(digits: &str) -> CardBrand {
    BRAND_PATTERNS
        .iter()
        .find(|(matches, _)| matches(digits))
        .map(|(_, brand)| *brand)
        .unwrap_or(CardBrand::Unknown)
}

/// Groups digits into blocks of four separated by a single space.
pub fn format_card_number(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    chars
        .chunks(4)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hides all but the last four digits, keeping the display grouping.
pub fn mask_card_number(digits: &str) -> String {
    let visible_from = digits.chars().count().saturating_sub(4);
    let masked: String = digits
        .chars()
        .enumerate()
        .map(|(i, c)| if i < visible_from { '•' } else { c })
        .collect();
    format_card_number(&masked)
}

/// Renders an expiry as `MM/YY`, dropping non-digits and anything past four digits.
pub fn format_expiry(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).take(4).collect();
    if digits.len() >= 2 {
        format!("{}/{}", &digits[..2], &digits[2..])
    } else {
        digits
    }
}

/// Currencies the wizard can display amounts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Php,
    Usd,
    Eur,
}

impl Currency {
    pub fn code(self) -> &'static str {
        match self {
            Currency::Php => "PHP",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Php => "₱",
            Currency::Usd => "$",
            Currency::Eur => "€",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PHP" => Ok(Currency::Php),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(WizardError::ValidationError(format!(
                "Unsupported currency: {other}"
            ))),
        }
    }
}

/// Formats an amount as `<symbol><grouped integer>.<2 decimals>`, e.g. `₱5,000.00`.
pub fn format_currency(amount: Decimal, currency: Currency) -> String {
    let mut rounded = amount
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .abs();
    rounded.rescale(2);
    let plain = rounded.to_string();
    let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{}{grouped}.{fraction}", currency.symbol())
}
