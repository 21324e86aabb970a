//! Minimal HTTP request router that runs controllers on a fixed pool of
//! worker threads.
//!
//! Routes are discovered once at startup from a directory of route groups.
//! Each request is matched by exact `"<METHOD>.<path>"` key, turned into a
//! [`routing::RequestContext`], and executed on a worker that resolves the
//! controller from a `(module path, index)` descriptor.

pub mod api;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod worker;

pub use config::RouterConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{ModuleCatalog, RouteTable};
pub use worker::WorkerPool;
