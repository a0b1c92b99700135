//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (drop client-supplied sysmeta)
//!     → webhook stage writes the sysmeta it owns
//!     → upstream
//! Outgoing response:
//!     → webhook stage reflects what the client may see
//!     → headers.rs (drop sysmeta before it reaches the client)
//! ```
//!
//! # Design Decisions
//! - System metadata belongs to the storage service and the proxy, never the client
//! - No trust in client input

pub mod headers;
