//! Checkout wizard core: the state machine, validators and formatters behind a
//! reservation → review → card → one-time passcode → confirmation flow.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod logging;
