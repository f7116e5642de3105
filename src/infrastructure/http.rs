//! HTTP adapter for the payment service.

use crate::config::WizardConfig;
use crate::domain::ports::{CardSubmission, OtpSubmission, PaymentService};
use crate::error::{Result, WizardError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

const CARD_PATH: &str = "";
const OTP_PATH: &str = "otp";
const RESEND_PATH: &str = "otp/resend";

/// Posts wizard submissions as JSON to the payment backend.
///
/// Any 2xx response is a success; the body is ignored.
#[derive(Debug, Clone)]
pub struct HttpPaymentService {
    client: Client,
    base_url: String,
}

impl HttpPaymentService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &WizardConfig) -> Result<Self> {
        let base_url = config.base_url.clone().ok_or_else(|| {
            WizardError::ValidationError("payment service base URL is not configured".to_string())
        })?;
        Self::new(base_url, config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        debug!(%url, "posting to payment service");
        let response = self.client.post(&url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(%url, %status, error = %e, "rejection body could not be read");
                    String::new()
                }
            };
            return Err(WizardError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentService for HttpPaymentService {
    async fn submit_card(&self, request: &CardSubmission) -> Result<()> {
        self.post(CARD_PATH, request).await
    }

    async fn submit_otp(&self, request: &OtpSubmission) -> Result<()> {
        self.post(OTP_PATH, request).await
    }

    async fn resend_otp(&self) -> Result<()> {
        self.post(RESEND_PATH, &serde_json::json!({})).await
    }
}
