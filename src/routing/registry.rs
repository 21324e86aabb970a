//! Route table construction and lookup.
//!
//! # Responsibilities
//! - Discover route groups under the API root
//! - Load each group's module and register its entries
//! - Look up a route descriptor by route key
//!
//! # Design Decisions
//! - Built once before the listener starts; immutable afterwards, so lookups
//!   need no locking
//! - Any malformed group fails the whole build; a partial table is never served
//! - Colliding keys: the later registration replaces the earlier one

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::routing::key::normalize;
use crate::routing::module::{
    list_subdirectories, module_path, ModuleCatalog, ModuleError, RouteEntry,
};

/// Identifies a controller by its position in its group's route list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDescriptor {
    pub module_index: usize,
    pub module_path: PathBuf,
}

/// Error type for route table construction.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("cannot read API folder {path}: {source}")]
    ApiFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed route group `{group}`: {source}")]
    Module {
        group: String,
        #[source]
        source: ModuleError,
    },
}

/// Immutable mapping from route key to route descriptor.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<String, RouteDescriptor>,
}

impl RouteTable {
    /// Scan `api_root` and register every route group found in `catalog`.
    pub fn build(api_root: &Path, catalog: &ModuleCatalog) -> Result<Self, RegistryError> {
        let api_folder_error = |source| RegistryError::ApiFolder {
            path: api_root.to_path_buf(),
            source,
        };
        let root = api_root.canonicalize().map_err(api_folder_error)?;
        let groups = list_subdirectories(&root).map_err(api_folder_error)?;

        let mut table = Self::default();
        for group in groups {
            let path = module_path(&root, &group);
            let entries = catalog.load(&path).map_err(|source| RegistryError::Module {
                group: group.clone(),
                source,
            })?;
            table.register_group(&group, &path, &entries);
        }

        tracing::info!(
            api_root = %root.display(),
            routes = table.len(),
            "Route table built"
        );
        Ok(table)
    }

    /// Register the entries of one group. Entry `i` gets descriptor `(path, i)`.
    pub fn register_group(&mut self, group: &str, module_path: &Path, entries: &[RouteEntry]) {
        for (index, entry) in entries.iter().enumerate() {
            let key = normalize(entry.method.as_str(), &format!("/{}{}", group, entry.path));
            let descriptor = RouteDescriptor {
                module_index: index,
                module_path: module_path.to_path_buf(),
            };

            tracing::debug!(key = %key, index, group, "Route registered");
            if let Some(previous) = self.routes.insert(key.clone(), descriptor) {
                tracing::warn!(
                    key = %key,
                    replaced_module = %previous.module_path.display(),
                    replaced_index = previous.module_index,
                    index,
                    "Route key registered twice, keeping the later entry"
                );
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&RouteDescriptor> {
        self.routes.get(key)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<_> = self.routes.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
