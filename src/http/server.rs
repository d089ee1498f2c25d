//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler
//! - Wire up middleware (tracing, request ID, CORS, preflight)
//! - Bind server to listener, plain or TLS
//! - Resolve each request to a command and dispatch it to the cluster
//! - Translate the outcome into a JSON response

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use axum_server::tls_rustls::RustlsConfig;
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::http::cors::{cors_layers, preflight_middleware};
use crate::http::request::{request_id, UuidRequestId};
use crate::http::response::{translate, GatewayResult};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::routing::{collect_params, RouteMatch, Router as GatewayRouter};
use crate::rpc::Dispatcher;

/// Local health endpoint, answered without touching the cluster.
pub const STATUS_PATH: &str = "/api/status";

const SERVICE_NAME: &str = "bedrock-gateway";

/// How long TLS connections may drain after shutdown is signalled.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<GatewayRouter>,
    pub dispatcher: Dispatcher,
    pub cluster_name: Arc<str>,
    pub max_body_bytes: usize,
}

/// HTTP front door of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    dispatcher: Dispatcher,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let dispatcher = Dispatcher::new(&config.cluster);
        Self::with_dispatcher(config, dispatcher)
    }

    /// Create a server around an existing dispatcher (shares its blacklist).
    pub fn with_dispatcher(config: GatewayConfig, dispatcher: Dispatcher) -> Self {
        let state = AppState {
            router: Arc::new(GatewayRouter::from_config(&config.routes)),
            dispatcher: dispatcher.clone(),
            cluster_name: Arc::from(config.cluster.name.as_str()),
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let mut router = Router::new()
            .route("/", any(gateway_handler))
            .route("/{*path}", any(gateway_handler))
            .with_state(state)
            .layer(middleware::from_fn(preflight_middleware));

        for layer in cors_layers() {
            router = router.layer(layer);
        }

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: ShutdownSignal) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            cluster = %self.config.cluster.name,
            endpoints = self.dispatcher.pool().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        tracing::info!(address = %addr, cluster = %self.config.cluster.name, "HTTPS server starting");

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            shutdown.recv().await;
            tracing::info!("Shutdown signal received");
            drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
        });

        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// Main gateway handler.
/// Looks up the route, dispatches the command, and translates the reply.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();
    let request_id = request_id(&parts.headers).map(str::to_string);

    if path == STATUS_PATH {
        if parts.method != Method::GET {
            return GatewayResult::error(405, "Method not allowed").into_response();
        }
        return status(&state).into_response();
    }

    let route = match state.router.lookup(&parts.method, path) {
        RouteMatch::Found(route) => route,
        RouteMatch::MethodNotAllowed => {
            tracing::debug!(method = %parts.method, path = %path, "Method not allowed");
            return GatewayResult::error(405, "Method not allowed").into_response();
        }
        RouteMatch::NotFound => {
            tracing::debug!(path = %path, "No route matched");
            return GatewayResult::error(404, "Endpoint not found").into_response();
        }
    };

    let form_body = if is_form(&parts.headers) {
        match axum::body::to_bytes(body, state.max_body_bytes).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Failed to read request body");
                return GatewayResult::error(413, "Request body too large or unreadable").into_response();
            }
        }
    } else {
        None
    };

    let params = collect_params(route, parts.uri.query(), form_body.as_deref());
    let rpc_request = match state.dispatcher.request(route.command.as_str(), params) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(command = %route.command, error = %e, "Rejected request parameters");
            return GatewayResult::error(400, e.to_string()).into_response();
        }
    };

    let outcome = state.dispatcher.dispatch(&rpc_request, request_id.as_deref()).await;
    let result = translate(&outcome);

    metrics::record_request(&route.command, result.http_status, start);
    tracing::info!(
        request_id = request_id.as_deref().unwrap_or("unknown"),
        command = %route.command,
        status = result.http_status,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Command completed"
    );

    result.into_response()
}

fn status(state: &AppState) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "cluster": &*state.cluster_name,
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        "blacklisted_endpoints": state.dispatcher.blacklist().active_count(),
    }))
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}
