//! Honeywatch command-line interface.
//!
//! The binary in `main.rs` only parses arguments, initializes logging and
//! dispatches to [`commands`]. Everything else lives here so integration
//! tests can drive the handlers directly.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod metrics_server;
pub mod output;
