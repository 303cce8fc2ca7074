//! Command handlers.
//!
//! Async entry points a front end calls with the shared `AppState`.

pub mod join;

pub use join::*;
