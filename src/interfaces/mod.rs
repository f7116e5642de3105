//! Driving adapters: ways for a collaborator to feed user actions into the wizard.

pub mod csv;
