//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up middleware (request ID, tracing)
//! - Look up each request's route key in the route table
//! - Build the invocation context and submit it to the worker pool
//! - Turn outcomes into responses (200, 404, 500)
//!
//! # Design Decisions
//! - Per-request failures never stop the server; they become responses
//! - No timeout layer: a request waits as long as its controller runs
//! - The worker pool is injected and shut down after the server stops

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Request, State},
    response::Response,
    routing::any,
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::request::{build_context, ContextError, X_REQUEST_ID};
use crate::http::response;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;
use crate::routing::{normalize, RouteDescriptor, RouteTable};
use crate::worker::{DispatchError, WorkerPool, WorkerTask};

/// Application state injected into handlers.
#[derive(Clone)]
struct AppState {
    routes: Arc<RouteTable>,
    pool: Arc<WorkerPool>,
    max_body_size: usize,
}

/// Failure of a routed request. Always answered with 500.
#[derive(Debug, thiserror::Error)]
enum RequestError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// HTTP listener for the router.
pub struct HttpServer {
    router: Router,
    pool: Arc<WorkerPool>,
}

impl HttpServer {
    /// Create a server over an already built route table and worker pool.
    pub fn new(routes: RouteTable, pool: Arc<WorkerPool>, max_body_size: usize) -> Self {
        let state = AppState {
            routes: Arc::new(routes),
            pool: pool.clone(),
            max_body_size,
        };

        let router = Self::build_router(state);
        Self { router, pool }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until `shutdown` fires or the process is signalled,
    /// then stop the worker pool.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            workers = self.pool.size(),
            "HTTP server starting"
        );

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.recv() => {
                        tracing::info!("Shutdown requested");
                    }
                }
            })
            .await;

        self.pool.shutdown().await;
        tracing::info!("HTTP server stopped");
        served
    }

    /// Handle to the worker pool this server dispatches to.
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.pool
    }
}

/// Catch-all handler: route lookup, context, dispatch, response.
async fn dispatch_handler(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let method = request.method().as_str().to_string();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let key = normalize(&method, request.uri().path());

    let Some(route) = state.routes.get(&key).cloned() else {
        tracing::warn!(request_id = %request_id, key = %key, "No such route");
        metrics::record_request(&method, 404, start_time);
        return response::not_found(&key);
    };

    tracing::debug!(
        request_id = %request_id,
        key = %key,
        index = route.module_index,
        "Dispatching request"
    );

    let response = match handle_routed(&state, route, request).await {
        Ok(value) => response::success(&value),
        Err(e) => {
            tracing::error!(request_id = %request_id, key = %key, error = %e, "Request failed");
            response::internal_error(&e.to_string())
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}

async fn handle_routed(
    state: &AppState,
    route: RouteDescriptor,
    request: Request,
) -> Result<Value, RequestError> {
    let params = build_context(request, state.max_body_size).await?;
    let value = state.pool.submit(WorkerTask { route, params }).await?;
    Ok(value)
}
