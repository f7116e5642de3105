use serde::Serialize;
use std::fmt;

use super::format::{detect_card_brand, format_card_number, format_expiry, mask_card_number};
use super::validation::{Field, ValidationErrors};

pub const MAX_CARD_DIGITS: usize = 16;
pub const MIN_CARD_DIGITS: usize = 13;
pub const EXPIRY_DIGITS: usize = 4;
pub const MIN_CVV_DIGITS: usize = 3;
pub const MAX_CVV_DIGITS: usize = 4;

/// Card network, derived from the number's leading digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Diners,
    Jcb,
    #[default]
    Unknown,
}

impl CardBrand {
    /// Upper-case label for the "detected" hint.
    pub fn label(self) -> &'static str {
        match self {
            CardBrand::Visa => "VISA",
            CardBrand::Mastercard => "MASTERCARD",
            CardBrand::Amex => "AMEX",
            CardBrand::Discover => "DISCOVER",
            CardBrand::Diners => "DINERS",
            CardBrand::Jcb => "JCB",
            CardBrand::Unknown => "UNKNOWN",
        }
    }

    pub fn is_known(self) -> bool {
        self != CardBrand::Unknown
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn all_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

/// Mutable card form owned by the Payment step.
///
/// Every setter applies the field's shape rule before touching state and
/// returns whether the value was taken. A refused value leaves the form as it
/// was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardForm {
    number: String,
    holder_name: String,
    expiry: String,
    cvv: String,
    brand: CardBrand,
}

impl CardForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts the number with any spacing removed; digits only, at most 16.
    pub fn set_number(&mut self, input: &str) -> bool {
        let value: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if value.len() > MAX_CARD_DIGITS || !all_digits(&value) {
            return false;
        }
        self.brand = detect_card_brand(&value);
        self.number = value;
        true
    }

    /// Holder names are stored upper-cased, as embossed on the card.
    pub fn set_holder_name(&mut self, input: &str) -> bool {
        self.holder_name = input.to_uppercase();
        true
    }

    /// Non-digits (such as the `/` of the display mask) are dropped first.
    pub fn set_expiry(&mut self, input: &str) -> bool {
        let value: String = input.chars().filter(char::is_ascii_digit).collect();
        if value.len() > EXPIRY_DIGITS {
            return false;
        }
        self.expiry = value;
        true
    }

    pub fn set_cvv(&mut self, input: &str) -> bool {
        if input.len() > MAX_CVV_DIGITS || !all_digits(input) {
            return false;
        }
        self.cvv = input.to_string();
        true
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn holder_name(&self) -> &str {
        &self.holder_name
    }

    pub fn expiry(&self) -> &str {
        &self.expiry
    }

    pub fn cvv(&self) -> &str {
        &self.cvv
    }

    pub fn brand(&self) -> CardBrand {
        self.brand
    }

    pub fn display_number(&self) -> String {
        format_card_number(&self.number)
    }

    pub fn display_expiry(&self) -> String {
        format_expiry(&self.expiry)
    }

    /// Brand never blocks submission, `Unknown` included.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if self.number.len() < MIN_CARD_DIGITS {
            errors.insert(Field::CardNumber, "Invalid card number");
        }
        if self.holder_name.trim().is_empty() {
            errors.insert(Field::CardName, "Cardholder name required");
        }
        if self.expiry.len() != EXPIRY_DIGITS {
            errors.insert(Field::Expiry, "Invalid expiry date");
        }
        if self.cvv.len() < MIN_CVV_DIGITS {
            errors.insert(Field::Cvv, "Invalid CVV");
        }
        errors
    }

    /// Snapshot of the form for the wizard context.
    pub fn freeze(&self) -> CardDetails {
        CardDetails {
            number: self.number.clone(),
            holder_name: self.holder_name.clone(),
            expiry: self.expiry.clone(),
            cvv: self.cvv.clone(),
            brand: self.brand,
        }
    }
}

/// Validated card data carried forward in the wizard context.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    pub number: String,
    pub holder_name: String,
    pub expiry: String,
    pub cvv: String,
    pub brand: CardBrand,
}

impl CardDetails {
    pub fn masked_number(&self) -> String {
        mask_card_number(&self.number)
    }

    pub fn last4(&self) -> &str {
        &self.number[self.number.len().saturating_sub(4)..]
    }
}

// Number and CVV stay out of logs and panic messages.
impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &self.masked_number())
            .field("holder_name", &self.holder_name)
            .field("expiry", &self.expiry)
            .field("cvv", &"***")
            .field("brand", &self.brand)
            .finish()
    }
}
