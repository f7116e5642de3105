//! Domain layer: the wizard's pure rules and the port to the payment service.
//!
//! Nothing in here performs I/O. Validators and formatters are plain functions
//! over step data so they can be re-run freely on every keystroke.

pub mod card;
pub mod context;
pub mod format;
pub mod otp;
pub mod ports;
pub mod reservation;
pub mod step;
pub mod validation;
