//! Worker subsystem.
//!
//! # Data Flow
//! ```text
//! Listener builds (RouteDescriptor, RequestContext)
//!     → pool.rs (enqueue WorkerTask, FIFO)
//!     → idle worker thread takes the task
//!     → executor.rs (load module by path, pick entry by index, run controller)
//!     → outcome sent back over a oneshot channel
//!     → Listener serializes the value
//! ```
//!
//! # Design Decisions
//! - Tasks carry descriptors, not closures
//! - Controller failures come back as values; the listener decides the status

pub mod executor;
pub mod pool;

use serde::{Deserialize, Serialize};

use crate::routing::{ControllerError, RequestContext, RouteDescriptor};

pub use executor::WorkerExecutor;
pub use pool::{default_pool_size, WorkerPool};

/// Unit of work submitted to the pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerTask {
    pub route: RouteDescriptor,
    pub params: RequestContext,
}

/// Why a submitted task produced no value.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error("cannot resolve route: {0}")]
    Resolve(String),
    #[error("worker stopped before completing the task")]
    WorkerLost,
    #[error("worker pool is shut down")]
    Closed,
}
