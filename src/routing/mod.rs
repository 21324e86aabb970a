//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     API root directory
//!     → module.rs (list group directories, load group modules)
//!     → registry.rs (normalize keys, record descriptors)
//!     → Freeze as immutable RouteTable
//!
//! Per request:
//!     (method, path) → key.rs → RouteTable lookup → RouteDescriptor or miss
//! ```
//!
//! # Design Decisions
//! - Exact key equality only, no patterns or path parameters
//! - Descriptors are plain data so they can cross into worker threads

pub mod context;
pub mod key;
pub mod module;
pub mod registry;

pub use context::{HeaderField, RequestContext};
pub use key::normalize;
pub use module::{
    Controller, ControllerError, ControllerResult, HttpMethod, ModuleCatalog, ModuleError,
    RouteEntry,
};
pub use registry::{RegistryError, RouteDescriptor, RouteTable};
