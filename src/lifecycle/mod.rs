//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every subscriber → server stops accepting → drain → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Background webhook tasks are not awaited on shutdown; each is already
//!   bounded by the webhook deadline

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
