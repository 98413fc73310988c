//! repodeck core - branch relation reconciliation with no I/O
//!
//! This crate contains the domain types, the relation classifier, the
//! per-project reconciliation state machine and view-models, and the ports
//! (interfaces) the application crate implements. It never touches git,
//! the file system or the network - those are handled by adapters.

pub mod app;
pub mod domain;
pub mod error;
pub mod ports;

// Re-exports for ergonomics
pub use domain::*;
pub use error::*;
