use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::WizardError;

/// Every input the wizard can attach an error to.
///
/// `Submit` is not a form field: it carries the step-scoped error raised when
/// the payment service call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    RoomType,
    CheckIn,
    CheckOut,
    Guests,
    Amount,
    CardNumber,
    CardName,
    Expiry,
    Cvv,
    Otp,
    Submit,
}

impl Field {
    pub fn as_str(self) -> &'static str {
        match self {
            Field::RoomType => "roomType",
            Field::CheckIn => "checkIn",
            Field::CheckOut => "checkOut",
            Field::Guests => "guests",
            Field::Amount => "amount",
            Field::CardNumber => "cardNumber",
            Field::CardName => "cardName",
            Field::Expiry => "expiry",
            Field::Cvv => "cvv",
            Field::Otp => "otp",
            Field::Submit => "submit",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = WizardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "roomType" => Field::RoomType,
            "checkIn" => Field::CheckIn,
            "checkOut" => Field::CheckOut,
            "guests" => Field::Guests,
            "amount" => Field::Amount,
            "cardNumber" => Field::CardNumber,
            "cardName" => Field::CardName,
            "expiry" => Field::Expiry,
            "cvv" => Field::Cvv,
            "otp" => Field::Otp,
            "submit" => Field::Submit,
            other => return Err(WizardError::UnknownEvent(format!("unknown field '{other}'"))),
        };
        Ok(field)
    }
}

/// Field-to-message mapping produced by a step validator.
///
/// A field without an entry is valid; a step may be submitted only when the
/// mapping is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    pub fn clear_field(&mut self, field: Field) {
        self.0.remove(&field);
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }
}
