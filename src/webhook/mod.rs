//! Container webhook subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → path.rs (classify /version/account/container[/object])
//!     → config_writer.rs (x-webhook / x-remove-webhook → container sysmeta)
//!     → next handler (storage service)
//!     → dispatcher.rs (successful non-GET object op → POST to webhook)
//!         → container_info.rs (current container sysmeta)
//!     → reflector.rs (container sysmeta → x-webhook)
//! Client response
//! ```
//!
//! # Design Decisions
//! - Headers are the metadata bus: the storage service persists
//!   `x-container-sysmeta-*` and treats an empty value as a tombstone
//! - Delivery is best effort: one attempt, hard deadline, failures only logged
//! - Nothing in this subsystem changes the status or body the client receives

pub mod config_writer;
pub mod container_info;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod path;
pub mod reflector;

pub use container_info::{ContainerInfo, ContainerInfoSource, UpstreamContainerInfo};
pub use dispatcher::{DispatchOutcome, Dispatcher, Notification, ObjectEvent};
pub use error::{WebhookError, WebhookResult};
pub use middleware::{webhook_middleware, WebhookState};
pub use path::StoragePath;

/// Request header carrying the callback URL to configure.
pub const X_WEBHOOK: &str = "x-webhook";

/// Request header carrying the callback credential.
pub const X_WEBHOOK_AUTH: &str = "x-webhook-auth";

/// Presence-only request header that removes the container's webhook.
pub const X_REMOVE_WEBHOOK: &str = "x-remove-webhook";

/// Client token forwarded into the notification body.
pub const X_AUTH_TOKEN: &str = "x-auth-token";

/// Prefix the storage service reserves for container system metadata.
pub const CONTAINER_SYSMETA_PREFIX: &str = "x-container-sysmeta-";

/// Sysmeta key (after the prefix) holding the callback URL.
pub const WEBHOOK_KEY: &str = "webhook";

/// Sysmeta key (after the prefix) holding the callback credential.
pub const WEBHOOK_AUTH_KEY: &str = "webhook-auth";

/// Persisted callback URL header.
pub const SYSMETA_WEBHOOK: &str = "x-container-sysmeta-webhook";

/// Persisted callback credential header.
pub const SYSMETA_WEBHOOK_AUTH: &str = "x-container-sysmeta-webhook-auth";

/// Name under which the subsystem registers in capability discovery.
pub const CAPABILITY_NAME: &str = "webhook";
