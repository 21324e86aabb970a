//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build route table → Start worker pool → Assemble server
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGINT/SIGTERM or Shutdown::trigger
//!     → Stop accepting → Drain in-flight requests → Stop worker pool
//! ```
//!
//! # Design Decisions
//! - Ordered startup: routes first, then workers, then listener
//! - Ordered shutdown: listener first, then workers

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{prepare, StartupError};
