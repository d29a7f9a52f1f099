//! Tiered subject taxonomy picker.
//!
//! Browse a taxonomy tier by tier and build the set of selected subject paths for an
//! item. See [`domain::SelectionState`] for the selection rules and
//! [`application::services::PickerService`] for the service that wires it to a
//! taxonomy source and a save sink.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
