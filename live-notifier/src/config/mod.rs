//! Configuration module.
//!
//! Settings come from the process environment (optionally seeded from a
//! `.env` file by `main`). Parsing is done over a key lookup so it can be
//! exercised without touching the real environment.

mod env;

pub use env::{
    AppConfig, DEFAULT_CHECK_INTERVAL_SECS, LogConfig, LogFormat, parse_channels, parse_flag,
    parse_interval, parse_list,
};
