//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use offload_router::config::RouterConfig;
use offload_router::lifecycle::{self, Shutdown};
use offload_router::{ModuleCatalog, WorkerPool};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A router running on an ephemeral port over a temporary API folder.
pub struct TestServer {
    pub addr: SocketAddr,
    pub pool: Arc<WorkerPool>,
    shutdown: Shutdown,
    handle: JoinHandle<std::io::Result<()>>,
    _api_dir: TempDir,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Start a router serving `groups` (one API subdirectory each) from `catalog`.
pub async fn start_server(catalog: ModuleCatalog, groups: &[&str], pool_size: usize) -> TestServer {
    let api_dir = tempfile::tempdir().unwrap();
    for group in groups {
        std::fs::create_dir(api_dir.path().join(group)).unwrap();
    }

    let mut config = RouterConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.api.folder_path = api_dir.path().to_path_buf();
    config.workers.pool_size = Some(pool_size);

    let server = lifecycle::prepare(config, catalog).unwrap();
    let pool = server.pool().clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    TestServer {
        addr,
        pool,
        shutdown,
        handle,
        _api_dir: api_dir,
    }
}

/// Client that never reuses connections between requests.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
