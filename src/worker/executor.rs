//! Per-worker task execution.
//!
//! # Responsibilities
//! - Resolve a route descriptor back into a controller
//! - Invoke the controller with the task's context
//! - Report the value or the failure to the pool
//!
//! # Design Decisions
//! - Each executor keeps its own module cache; nothing is shared with the
//!   registering side except the catalog of registration functions
//! - Panics are caught and reported like any other controller failure

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;

use crate::routing::{Controller, ControllerError, ModuleCatalog, RouteDescriptor, RouteEntry};
use crate::worker::{DispatchError, WorkerTask};

/// Runs tasks on behalf of a single worker.
pub struct WorkerExecutor {
    worker_id: usize,
    catalog: Arc<ModuleCatalog>,
    /// Route lists loaded by this worker, by module path.
    modules: HashMap<PathBuf, Vec<RouteEntry>>,
}

impl WorkerExecutor {
    pub fn new(worker_id: usize, catalog: Arc<ModuleCatalog>) -> Self {
        Self {
            worker_id,
            catalog,
            modules: HashMap::new(),
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    /// Number of modules this worker has loaded so far.
    pub fn loaded_modules(&self) -> usize {
        self.modules.len()
    }

    /// Execute one task to completion.
    pub async fn execute(&mut self, task: WorkerTask) -> Result<Value, DispatchError> {
        let controller = self.resolve(&task.route)?;

        tracing::debug!(
            worker = self.worker_id,
            module = %task.route.module_path.display(),
            index = task.route.module_index,
            "Executing controller"
        );

        let future = catch_unwind(AssertUnwindSafe(|| controller(task.params)))
            .map_err(|panic| DispatchError::Controller(panic_error(panic)))?;

        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(result) => result.map_err(DispatchError::Controller),
            Err(panic) => Err(DispatchError::Controller(panic_error(panic))),
        }
    }

    fn resolve(&mut self, route: &RouteDescriptor) -> Result<Controller, DispatchError> {
        if !self.modules.contains_key(&route.module_path) {
            let routes = self
                .catalog
                .load(&route.module_path)
                .map_err(|err| DispatchError::Resolve(err.to_string()))?;
            tracing::debug!(
                worker = self.worker_id,
                module = %route.module_path.display(),
                routes = routes.len(),
                "Module loaded"
            );
            self.modules.insert(route.module_path.clone(), routes);
        }

        self.modules
            .get(&route.module_path)
            .and_then(|routes| routes.get(route.module_index))
            .map(|entry| entry.controller.clone())
            .ok_or_else(|| {
                DispatchError::Resolve(format!(
                    "no route at index {} in {}",
                    route.module_index,
                    route.module_path.display()
                ))
            })
    }
}

fn panic_error(panic: Box<dyn Any + Send>) -> ControllerError {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    ControllerError::new(format!("controller panicked: {}", detail))
}
