//! Route modules and the compiled-in module catalog.
//!
//! # Responsibilities
//! - Define the shape of a route group's exported route list
//! - Map route groups to their registration functions
//! - Load a route module from its module path
//! - List the route group directories under the API root
//!
//! # Design Decisions
//! - Controllers are identified across threads by `(module path, index)`,
//!   never by handing a closure from the registering side to a worker
//! - Every load calls the registration function again, so each caller gets
//!   its own copy of the route list

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::routing::context::RequestContext;

/// File name used for the module path inside each group directory.
pub const ROUTER_MODULE: &str = "router";

/// Methods a route entry may be registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ControllerError {
    message: String,
}

impl ControllerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for ControllerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ControllerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for ControllerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

pub type ControllerResult = Result<Value, ControllerError>;

/// A request handler. Invoked on a worker thread with an owned context.
pub type Controller =
    Arc<dyn Fn(RequestContext) -> BoxFuture<'static, ControllerResult> + Send + Sync>;

/// One exported route of a route group.
#[derive(Clone)]
pub struct RouteEntry {
    pub method: HttpMethod,
    pub path: String,
    pub controller: Controller,
}

impl RouteEntry {
    pub fn new<F, Fut>(method: HttpMethod, path: impl Into<String>, controller: F) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ControllerResult> + Send + 'static,
    {
        Self {
            method,
            path: path.into(),
            controller: Arc::new(move |ctx: RequestContext| controller(ctx).boxed()),
        }
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Registration function of a route group, returning its ordered route list.
pub type GroupModule = Arc<dyn Fn() -> Vec<RouteEntry> + Send + Sync>;

/// Error type for module loading.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("module path {0} does not name a route group")]
    InvalidPath(PathBuf),
    #[error("route group `{group}` has no registered module ({path})")]
    UnknownGroup { group: String, path: PathBuf },
    #[error("route group `{group}` exports no routes")]
    Empty { group: String },
}

/// Compiled-in registry of route group modules, keyed by group name.
#[derive(Clone, Default)]
pub struct ModuleCatalog {
    groups: HashMap<String, GroupModule>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the module for a group directory named `name`.
    pub fn with_group<F>(mut self, name: impl Into<String>, module: F) -> Self
    where
        F: Fn() -> Vec<RouteEntry> + Send + Sync + 'static,
    {
        self.groups.insert(name.into(), Arc::new(module));
        self
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Load the module at `module_path` and return a fresh copy of its routes.
    ///
    /// The group is the name of the directory containing the module file.
    pub fn load(&self, module_path: &Path) -> Result<Vec<RouteEntry>, ModuleError> {
        let group = module_path
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .ok_or_else(|| ModuleError::InvalidPath(module_path.to_path_buf()))?;

        let module = self
            .groups
            .get(group)
            .ok_or_else(|| ModuleError::UnknownGroup {
                group: group.to_string(),
                path: module_path.to_path_buf(),
            })?;

        let routes = module();
        if routes.is_empty() {
            return Err(ModuleError::Empty {
                group: group.to_string(),
            });
        }
        Ok(routes)
    }
}

impl fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.groups.keys().collect();
        names.sort();
        f.debug_struct("ModuleCatalog").field("groups", &names).finish()
    }
}

/// Module path of `group` under an (already resolved) API root.
pub fn module_path(api_root: &Path, group: &str) -> PathBuf {
    api_root.join(group).join(ROUTER_MODULE)
}

/// Names of the immediate subdirectories of `path`, sorted. Files are skipped.
///
/// A directory whose name is not valid UTF-8 cannot name a route group and
/// fails the whole listing.
pub fn list_subdirectories(path: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("route group directory {:?} is not valid UTF-8", name),
                ));
            }
        }
    }
    names.sort();
    Ok(names)
}
