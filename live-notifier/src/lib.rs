//! live-notifier library crate.
//!
//! Polls a streaming platform on a fixed interval, tracks which monitored
//! channels are live, and fans notifications out to the configured targets
//! whenever a channel goes live (or, optionally, offline).

pub mod config;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod notification;
pub mod panic_hook;
pub mod utils;

pub use error::{Error, Result};
