//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, route key lookup)
//!     → request.rs (query, headers, drained JSON body → RequestContext)
//!     → [worker pool executes the controller]
//!     → response.rs (serialize result or JSON error)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{build_context, ContextError, REQUEST_ID_KEY, X_REQUEST_ID};
pub use server::HttpServer;
