//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the route table from the API folder
//! - Start the worker pool
//! - Assemble the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The route table is complete before a single worker or socket exists

use std::sync::Arc;

use crate::config::RouterConfig;
use crate::http::HttpServer;
use crate::routing::{ModuleCatalog, RegistryError, RouteTable};
use crate::worker::WorkerPool;

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[source] std::io::Error),
}

/// Build everything the server needs, in dependency order.
pub fn prepare(config: RouterConfig, catalog: ModuleCatalog) -> Result<HttpServer, StartupError> {
    let routes = RouteTable::build(&config.api.folder_path, &catalog)?;
    if routes.is_empty() {
        tracing::warn!(
            api_folder = %config.api.folder_path.display(),
            "No routes registered; every request will get 404"
        );
    }

    let pool_size = config.workers.resolved_pool_size();
    let pool = WorkerPool::start(pool_size, Arc::new(catalog)).map_err(StartupError::WorkerPool)?;

    Ok(HttpServer::new(routes, Arc::new(pool), config.limits.max_body_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::{HttpMethod, RouteEntry};
    use serde_json::json;

    #[tokio::test]
    async fn test_prepare_sizes_pool_from_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ping")).unwrap();

        let mut config = RouterConfig::default();
        config.api.folder_path = dir.path().to_path_buf();
        config.workers.pool_size = Some(3);
        let catalog = ModuleCatalog::new().with_group("ping", || {
            vec![RouteEntry::new(HttpMethod::Get, "/", |_| async { Ok(json!("pong")) })]
        });

        let server = prepare(config, catalog).unwrap();
        assert_eq!(server.pool().size(), 3);
        server.pool().shutdown().await;
    }

    #[test]
    fn test_prepare_fails_on_malformed_group() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("unknown")).unwrap();

        let mut config = RouterConfig::default();
        config.api.folder_path = dir.path().to_path_buf();

        let err = prepare(config, ModuleCatalog::new()).err().unwrap();
        assert!(matches!(err, StartupError::Registry(RegistryError::Module { .. })));
    }
}
