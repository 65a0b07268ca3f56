//! Handle gateway library.
//!
//! Resolves domains and `acct:` resources to accounts held by an external
//! directory, and coordinates startup and graceful shutdown of the service.

pub mod config;
pub mod directory;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod resolver;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Coordinator;
