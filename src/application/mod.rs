//! Application layer containing the wizard orchestration.
//!
//! This module defines the `WizardController`, the state machine the
//! presentation layer drives. It owns the current step's form state and the
//! accumulated context, and is the only component that talks to the
//! `PaymentService` port.

pub mod wizard;
