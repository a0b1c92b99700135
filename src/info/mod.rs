//! Capability discovery.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     subsystems → registry.rs (register name)
//!
//! GET /info:
//!     handlers.rs → upstream /info (JSON object)
//!                 → merge registered capabilities
//!                 → client
//! ```
//!
//! # Design Decisions
//! - Registration carries a name only; no settings are exposed
//! - The registry is frozen once the server is built

pub mod handlers;
pub mod registry;

pub use handlers::info_handler;
pub use registry::Capabilities;
