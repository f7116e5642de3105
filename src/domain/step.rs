use serde::Serialize;
use std::fmt;

/// The stages of the checkout wizard, in the only order they can be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Reservation,
    Checkout,
    Payment,
    Verification,
    Complete,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Reservation,
        Step::Checkout,
        Step::Payment,
        Step::Verification,
        Step::Complete,
    ];

    /// The step a successful forward transition lands on. `Complete` is terminal.
    pub fn next(self) -> Option<Step> {
        match self {
            Step::Reservation => Some(Step::Checkout),
            Step::Checkout => Some(Step::Payment),
            Step::Payment => Some(Step::Verification),
            Step::Verification => Some(Step::Complete),
            Step::Complete => None,
        }
    }

    /// Zero-based position, used by progress indicators.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Reservation => "Reservation Details",
            Step::Checkout => "Your Reservation",
            Step::Payment => "Payment Details",
            Step::Verification => "Verify Your Payment",
            Step::Complete => "Booking Confirmed!",
        }
    }

    /// Whether leaving this step requires a call to the payment service.
    pub fn submits_to_service(self) -> bool {
        matches!(self, Step::Payment | Step::Verification)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Reservation => "reservation",
            Step::Checkout => "checkout",
            Step::Payment => "payment",
            Step::Verification => "verification",
            Step::Complete => "complete",
        };
        f.write_str(name)
    }
}
