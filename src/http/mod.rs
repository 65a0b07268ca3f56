//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, query parameter extraction)
//!     → handlers.rs (tls-check, check-handle, webfinger, health)
//!     → resolver (policy, then directory lookup)
//!     → response.rs (status mapping, JSON / JRD bodies)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use handlers::AppState;
pub use request::X_REQUEST_ID;
pub use server::{build_router, HttpServer};
