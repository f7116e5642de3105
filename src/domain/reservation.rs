use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::str::FromStr;

use super::format::{Currency, format_currency};
use super::validation::{Field, ValidationErrors};
use crate::error::WizardError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const MAX_DATE_LEN: usize = 10;
const MAX_GUEST_DIGITS: usize = 3;
const MAX_AMOUNT_DECIMALS: usize = 2;

/// Represents a positive payment amount.
///
/// Wraps `rust_decimal::Decimal` so that a `Reservation` can never carry a
/// zero or negative amount.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, WizardError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(WizardError::ValidationError(
                "Amount must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = WizardError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

// The payment service expects a JSON number.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

/// A validated, immutable booking request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    room_type: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: u32,
    amount: Amount,
}

impl Reservation {
    pub fn new(
        room_type: impl Into<String>,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guests: u32,
        amount: Amount,
    ) -> Result<Self, WizardError> {
        let room_type = room_type.into();
        if room_type.trim().is_empty() {
            return Err(WizardError::ValidationError(
                "Room type is required".to_string(),
            ));
        }
        if check_out <= check_in {
            return Err(WizardError::ValidationError(
                "Check-out must be after check-in".to_string(),
            ));
        }
        if guests < 1 {
            return Err(WizardError::ValidationError(
                "At least one guest is required".to_string(),
            ));
        }
        Ok(Self {
            room_type,
            check_in,
            check_out,
            guests,
            amount,
        })
    }

    pub fn room_type(&self) -> &str {
        &self.room_type
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn guests(&self) -> u32 {
        self.guests
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn summary(&self, currency: Currency) -> ReservationSummary {
        ReservationSummary {
            room_type: self.room_type.clone(),
            check_in: self.check_in.format(DATE_FORMAT).to_string(),
            check_out: self.check_out.format(DATE_FORMAT).to_string(),
            guests: self.guests.to_string(),
            amount: format_currency(self.amount.value(), currency),
            nights: self.nights().to_string(),
        }
    }
}

/// Display-ready reservation fields for the review screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSummary {
    pub room_type: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: String,
    pub amount: String,
    pub nights: String,
}

impl ReservationSummary {
    /// Placeholder shown when the context holds no reservation.
    pub fn placeholder() -> Self {
        let dash = || "—".to_string();
        Self {
            room_type: dash(),
            check_in: dash(),
            check_out: dash(),
            guests: dash(),
            amount: dash(),
            nights: dash(),
        }
    }
}

/// Raw reservation input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationForm {
    pub room_type: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: String,
    pub amount: String,
}

impl ReservationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_room_type(&mut self, input: &str) -> bool {
        self.room_type = input.to_string();
        true
    }

    pub fn set_check_in(&mut self, input: &str) -> bool {
        accept_date(&mut self.check_in, input)
    }

    pub fn set_check_out(&mut self, input: &str) -> bool {
        accept_date(&mut self.check_out, input)
    }

    pub fn set_guests(&mut self, input: &str) -> bool {
        if input.len() > MAX_GUEST_DIGITS || !input.chars().all(|c| c.is_ascii_digit()) {
            return false;
        }
        self.guests = input.to_string();
        true
    }

    pub fn set_amount(&mut self, input: &str) -> bool {
        if !is_amount_shape(input) {
            return false;
        }
        self.amount = input.to_string();
        true
    }

    /// Runs every check independently so one submit surfaces all problems.
    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();

        if self.room_type.trim().is_empty() {
            errors.insert(Field::RoomType, "Room type is required");
        }

        let check_in = check_date(&mut errors, Field::CheckIn, &self.check_in, "Check-in");
        let check_out = check_date(&mut errors, Field::CheckOut, &self.check_out, "Check-out");
        if let (Some(check_in), Some(check_out)) = (check_in, check_out)
            && check_out <= check_in
        {
            errors.insert(Field::CheckOut, "Check-out must be after check-in");
        }

        if parse_guests(&self.guests).is_none() {
            errors.insert(Field::Guests, "Enter number of guests");
        }

        if parse_amount(&self.amount).is_none() {
            errors.insert(Field::Amount, "Enter a valid payment amount");
        }

        errors
    }

    /// Validates and builds the immutable `Reservation`.
    pub fn to_reservation(&self) -> Result<Reservation, ValidationErrors> {
        let errors = self.validate();
        if !errors.is_empty() {
            return Err(errors);
        }
        let parsed = (
            parse_date(&self.check_in),
            parse_date(&self.check_out),
            parse_guests(&self.guests),
            parse_amount(&self.amount),
        );
        match parsed {
            (Some(check_in), Some(check_out), Some(guests), Some(amount)) => {
                Reservation::new(self.room_type.trim(), check_in, check_out, guests, amount)
                    .map_err(|_| errors)
            }
            _ => Err(errors),
        }
    }
}

fn accept_date(slot: &mut String, input: &str) -> bool {
    if input.len() > MAX_DATE_LEN || !input.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return false;
    }
    *slot = input.to_string();
    true
}

fn is_amount_shape(input: &str) -> bool {
    let mut parts = input.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();
    whole.chars().all(|c| c.is_ascii_digit())
        && fraction.is_none_or(|f| {
            f.len() <= MAX_AMOUNT_DECIMALS && f.chars().all(|c| c.is_ascii_digit())
        })
}

fn check_date(
    errors: &mut ValidationErrors,
    field: Field,
    raw: &str,
    label: &str,
) -> Option<NaiveDate> {
    if raw.trim().is_empty() {
        errors.insert(field, format!("{label} date is required"));
        return None;
    }
    let parsed = parse_date(raw);
    if parsed.is_none() {
        errors.insert(field, "Enter a valid date");
    }
    parsed
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn parse_guests(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n >= 1)
}

fn parse_amount(raw: &str) -> Option<Amount> {
    Decimal::from_str(raw.trim())
        .ok()
        .and_then(|d| Amount::new(d).ok())
}
