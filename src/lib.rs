//! Webhook notifications for Swift object storage.
//!
//! A reverse proxy that sits in front of a Swift-compatible storage service,
//! lets clients attach a webhook to a container, and POSTs a notification to
//! it whenever an object in that container is written.

pub mod config;
pub mod http;
pub mod info;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod webhook;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
