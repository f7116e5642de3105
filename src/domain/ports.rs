use super::card::{CardBrand, CardDetails};
use super::format::mask_card_number;
use super::reservation::Reservation;
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Body of the card submission.
///
/// The service names the detected brand `cardType`.
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSubmission {
    pub card_number: String,
    pub card_name: String,
    pub expiry: String,
    pub cvv: String,
    #[serde(rename = "cardType")]
    pub detected_brand: CardBrand,
    pub reservation: Reservation,
}

impl CardSubmission {
    pub fn new(card: &CardDetails, reservation: &Reservation) -> Self {
        Self {
            card_number: card.number.clone(),
            card_name: card.holder_name.clone(),
            expiry: card.expiry.clone(),
            cvv: card.cvv.clone(),
            detected_brand: card.brand,
            reservation: reservation.clone(),
        }
    }
}

impl fmt::Debug for CardSubmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardSubmission")
            .field("card_number", &mask_card_number(&self.card_number))
            .field("card_name", &self.card_name)
            .field("detected_brand", &self.detected_brand)
            .field("reservation", &self.reservation)
            .finish_non_exhaustive()
    }
}

/// Body of the verification call; sent on its own, never with card data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtpSubmission {
    pub otp: String,
}

/// The external payment backend. Success carries no payload the wizard uses.
#[async_trait]
pub trait PaymentService: Send + Sync {
    async fn submit_card(&self, request: &CardSubmission) -> Result<()>;
    async fn submit_otp(&self, request: &OtpSubmission) -> Result<()>;
    /// Asks the service to issue a fresh code and restart its expiry window.
    async fn resend_otp(&self) -> Result<()>;
}

pub type PaymentServiceRef = Arc<dyn PaymentService>;
