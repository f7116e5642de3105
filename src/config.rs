//! Runtime configuration.

use crate::domain::format::Currency;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for a wizard session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    /// Payment service base URL (e.g. "http://localhost:8080"). Without one the
    /// in-memory service is used.
    pub base_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Currency amounts are displayed in
    pub currency: Currency,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            currency: Currency::default(),
        }
    }
}

impl WizardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn is_offline(&self) -> bool {
        self.base_url.is_none()
    }
}
