//! Handlers for the container and performance routes

use super::{error::ApiError, AppState};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use manager_lib::{
    health::components, ContainerSummary, LifecycleCommand, ManagedContainer, ManagerError,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub since: Option<u64>,
    pub until: Option<u64>,
}

/// `GET /containers`
pub async fn list_containers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ContainerSummary>>, ApiError> {
    let started = Instant::now();
    let result = state.catalog.list().await;
    state
        .record("list", components::RUNTIME, started, &result)
        .await;

    let containers = result?;
    state.metrics.set_managed_containers(containers.len() as i64);

    Ok(Json(
        containers.iter().map(ManagedContainer::summary).collect(),
    ))
}

/// `GET /containers/:id/logs?since=&until=`
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<Vec<String>>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let started = Instant::now();
    let result = state.logs.get_logs(&id, query.since, query.until).await;
    state
        .record("logs", components::RUNTIME, started, &result)
        .await;

    Ok(Json(result?))
}

/// `POST /containers/:id/:command`
pub async fn run_command(
    State(state): State<Arc<AppState>>,
    Path((id, command)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let command: LifecycleCommand = command.parse().map_err(|_| ManagerError::NotFound)?;

    let started = Instant::now();
    let result = state.lifecycle.execute(&id, command).await;
    state
        .record(command.as_str(), components::RUNTIME, started, &result)
        .await;
    state
        .metrics
        .inc_lifecycle_command(command.as_str(), result.is_ok());

    result?;
    Ok(StatusCode::OK)
}

/// `POST /containers/:id/logs` is not a lifecycle command
pub async fn unknown_command() -> ApiError {
    ApiError::from(ManagerError::NotFound)
}

/// `DELETE /containers/:id`
pub async fn delete_container(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let started = Instant::now();
    let result = state.lifecycle.delete(&id).await;
    state
        .record("delete", components::RUNTIME, started, &result)
        .await;

    result?;
    state.metrics.inc_containers_deleted();
    Ok(StatusCode::OK)
}

/// `GET /performance`
///
/// Answers `[]` when no metrics collector is configured.
pub async fn performance(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let started = Instant::now();
    let result = state.performance.snapshot().await;

    if state.performance.is_configured() {
        state
            .record("performance", components::METRICS, started, &result)
            .await;
    }

    Ok(match result? {
        Some(snapshot) => Json(snapshot).into_response(),
        None => Json(Vec::<serde_json::Value>::new()).into_response(),
    })
}
