use crate::domain::ports::{CardSubmission, OtpSubmission, PaymentService};
use crate::error::{Result, WizardError};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// A thread-safe in-memory payment service.
///
/// Records every request it receives and approves them unless told to reject
/// a given kind. Clones share the same records, so a test can keep a handle
/// while the controller owns another. Also backs offline CLI runs.
#[derive(Default, Clone)]
pub struct InMemoryPaymentService {
    cards: Arc<RwLock<Vec<CardSubmission>>>,
    codes: Arc<RwLock<Vec<OtpSubmission>>>,
    resends: Arc<AtomicUsize>,
    reject_cards: Arc<AtomicBool>,
    reject_codes: Arc<AtomicBool>,
    reject_resends: Arc<AtomicBool>,
}

fn declined(what: &str) -> WizardError {
    WizardError::Rejected {
        status: 402,
        message: format!("{what} declined"),
    }
}

impl InMemoryPaymentService {
    /// Creates a new service that approves everything.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_cards(&self, reject: bool) {
        self.reject_cards.store(reject, Ordering::SeqCst);
    }

    pub fn reject_codes(&self, reject: bool) {
        self.reject_codes.store(reject, Ordering::SeqCst);
    }

    pub fn reject_resends(&self, reject: bool) {
        self.reject_resends.store(reject, Ordering::SeqCst);
    }

    pub async fn card_submissions(&self) -> Vec<CardSubmission> {
        self.cards.read().await.clone()
    }

    pub async fn otp_submissions(&self) -> Vec<OtpSubmission> {
        self.codes.read().await.clone()
    }

    pub fn resend_count(&self) -> usize {
        self.resends.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentService for InMemoryPaymentService {
    async fn submit_card(&self, request: &CardSubmission) -> Result<()> {
        self.cards.write().await.push(request.clone());
        if self.reject_cards.load(Ordering::SeqCst) {
            return Err(declined("card"));
        }
        Ok(())
    }

    async fn submit_otp(&self, request: &OtpSubmission) -> Result<()> {
        self.codes.write().await.push(request.clone());
        if self.reject_codes.load(Ordering::SeqCst) {
            return Err(declined("code"));
        }
        Ok(())
    }

    async fn resend_otp(&self) -> Result<()> {
        if self.reject_resends.load(Ordering::SeqCst) {
            return Err(declined("resend"));
        }
        self.resends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
