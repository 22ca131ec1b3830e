//! Core domain + application logic for the expense tracker.
//!
//! This crate is framework-agnostic. Telegram, HTTP and the exchange-rate page
//! live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod dates;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod form;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod report;
pub mod sessions;
pub mod utils;
pub mod validators;

pub use errors::{Error, Result};
