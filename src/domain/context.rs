use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use super::card::{CardBrand, CardDetails};
use super::format::Currency;
use super::reservation::{Reservation, ReservationSummary};
use crate::error::WizardError;

const BOOKING_PREFIX: &str = "PR";

/// Display-only booking reference, `PR` followed by six digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let suffix: u32 = rng.gen_range(100_000..=999_999);
        Self(format!("{BOOKING_PREFIX}{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The code the payment service accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpConfirmation {
    pub code: String,
}

/// Accumulated wizard payload.
///
/// Each slot is filled exactly once, by the step that owns it, and every
/// `with_*` call returns a new context instead of mutating the old one. A
/// step therefore only ever sees what earlier steps produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardContext {
    reservation: Option<Arc<Reservation>>,
    card: Option<CardDetails>,
    otp: Option<OtpConfirmation>,
    booking_id: Option<BookingId>,
}

fn occupied(slot: &str) -> WizardError {
    WizardError::ValidationError(format!("context already holds a {slot}"))
}

impl WizardContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reservation(&self, reservation: Reservation) -> Result<Self, WizardError> {
        if self.reservation.is_some() {
            return Err(occupied("reservation"));
        }
        Ok(Self {
            reservation: Some(Arc::new(reservation)),
            ..self.clone()
        })
    }

    pub fn with_card(&self, card: CardDetails) -> Result<Self, WizardError> {
        if self.card.is_some() {
            return Err(occupied("card"));
        }
        Ok(Self {
            card: Some(card),
            ..self.clone()
        })
    }

    pub fn with_otp(&self, otp: OtpConfirmation) -> Result<Self, WizardError> {
        if self.otp.is_some() {
            return Err(occupied("verification code"));
        }
        Ok(Self {
            otp: Some(otp),
            ..self.clone()
        })
    }

    pub fn with_booking_id(&self, booking_id: BookingId) -> Result<Self, WizardError> {
        if self.booking_id.is_some() {
            return Err(occupied("booking id"));
        }
        Ok(Self {
            booking_id: Some(booking_id),
            ..self.clone()
        })
    }

    pub fn reservation(&self) -> Option<&Arc<Reservation>> {
        self.reservation.as_ref()
    }

    pub fn card(&self) -> Option<&CardDetails> {
        self.card.as_ref()
    }

    pub fn otp(&self) -> Option<&OtpConfirmation> {
        self.otp.as_ref()
    }

    pub fn booking_id(&self) -> Option<&BookingId> {
        self.booking_id.as_ref()
    }

    /// A serializable view with card data reduced to what a receipt shows.
    pub fn view(&self, currency: Currency) -> ContextView {
        ContextView {
            reservation: self
                .reservation
                .as_ref()
                .map(|r| r.summary(currency))
                .unwrap_or_else(ReservationSummary::placeholder),
            has_reservation: self.reservation.is_some(),
            card_brand: self.card.as_ref().map(|c| c.brand),
            card_number: self.card.as_ref().map(CardDetails::masked_number),
            card_holder: self.card.as_ref().map(|c| c.holder_name.clone()),
            verified: self.otp.is_some(),
            booking_id: self.booking_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextView {
    pub reservation: ReservationSummary,
    pub has_reservation: bool,
    pub card_brand: Option<CardBrand>,
    pub card_number: Option<String>,
    pub card_holder: Option<String>,
    pub verified: bool,
    pub booking_id: Option<BookingId>,
}
