//! HTTP API: container control plane, health checks and Prometheus metrics

pub mod error;
pub mod handlers;
pub mod middleware;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use manager_lib::{
    auth::IdentityGate,
    containers::{ContainerCatalog, LifecycleGuard, LogWindow, OwnershipMarker},
    health::{ComponentStatus, HealthRegistry},
    performance::PerformanceService,
    runtime::ContainerRuntime,
    ManagerMetrics, ManagerResult, StructuredLogger,
};
use prometheus::{Encoder, TextEncoder};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub catalog: ContainerCatalog,
    pub lifecycle: LifecycleGuard,
    pub logs: LogWindow,
    pub performance: PerformanceService,
    /// `None` leaves the core routes ungated
    pub gate: Option<IdentityGate>,
    pub health_registry: HealthRegistry,
    pub metrics: ManagerMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        marker: OwnershipMarker,
        performance: PerformanceService,
        gate: Option<IdentityGate>,
        health_registry: HealthRegistry,
        metrics: ManagerMetrics,
        logger: StructuredLogger,
    ) -> Self {
        let catalog = ContainerCatalog::new(runtime, marker);

        Self {
            lifecycle: LifecycleGuard::new(catalog.clone(), logger.clone()),
            logs: LogWindow::new(catalog.clone()),
            catalog,
            performance,
            gate,
            health_registry,
            metrics,
            logger,
        }
    }

    /// Record latency and collaborator health for one operation.
    ///
    /// Caller errors (`NotFound`, `PreconditionFailed`) say nothing about
    /// the collaborator and leave its health untouched.
    pub(crate) async fn record<T>(
        &self,
        operation: &str,
        component: &str,
        started: Instant,
        result: &ManagerResult<T>,
    ) {
        self.metrics
            .observe_request_latency(operation, started.elapsed().as_secs_f64());

        match result {
            Ok(_) => self.health_registry.set_healthy(component).await,
            Err(e) if e.is_collaborator_failure() => {
                let reason = e.to_string();
                self.metrics.inc_collaborator_errors(component);
                self.logger.log_collaborator_failure(component, &reason);
                self.health_registry.set_degraded(component, reason).await;
            }
            Err(_) => {}
        }
    }
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let core = Router::new()
        .route("/containers", get(handlers::list_containers))
        .route("/containers/:id", delete(handlers::delete_container))
        .route("/containers/:id/", delete(handlers::delete_container))
        .route(
            "/containers/:id/logs",
            get(handlers::get_logs).post(handlers::unknown_command),
        )
        .route("/containers/:id/:command", post(handlers::run_command))
        .route("/containers/:id/:command/", post(handlers::run_command))
        .route("/performance", get(handlers::performance))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_identity,
        ));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .merge(core)
        .layer(from_fn(middleware::cors))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve<F>(addr: SocketAddr, state: Arc<AppState>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
