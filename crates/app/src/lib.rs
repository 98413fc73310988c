//! repodeck application library
//!
//! Adapters, the application service, the CLI and the TUI, exposed for the
//! binary and for integration tests.

pub mod adapters;
pub mod cli;
pub mod runtime;
pub mod services;
pub mod tui;
