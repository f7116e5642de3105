//! Adapters implementing the `PaymentService` port.

pub mod http;
pub mod in_memory;
