//! Observability infrastructure for the container manager
//!
//! Provides:
//! - Prometheus metrics (request latency, lifecycle commands, deletions,
//!   managed container count, collaborator errors)
//! - Structured JSON logging of control plane events with tracing

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    HistogramVec, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for request latency (seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

static GLOBAL_METRICS: OnceLock<ManagerMetricsInner> = OnceLock::new();

struct ManagerMetricsInner {
    request_latency_seconds: HistogramVec,
    lifecycle_commands: IntCounterVec,
    containers_deleted: IntCounter,
    managed_containers: IntGauge,
    collaborator_errors: IntCounterVec,
}

impl ManagerMetricsInner {
    fn new() -> Self {
        Self {
            request_latency_seconds: register_histogram_vec!(
                "container_manager_request_latency_seconds",
                "Time spent serving control plane operations",
                &["operation"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register request_latency_seconds"),

            lifecycle_commands: register_int_counter_vec!(
                "container_manager_lifecycle_commands_total",
                "Lifecycle commands forwarded to the container runtime",
                &["command", "outcome"]
            )
            .expect("Failed to register lifecycle_commands_total"),

            containers_deleted: register_int_counter!(
                "container_manager_containers_deleted_total",
                "Managed containers removed through the API"
            )
            .expect("Failed to register containers_deleted_total"),

            managed_containers: register_int_gauge!(
                "container_manager_managed_containers",
                "Managed containers seen at the last listing"
            )
            .expect("Failed to register managed_containers"),

            collaborator_errors: register_int_counter_vec!(
                "container_manager_collaborator_errors_total",
                "Failed calls to external collaborators",
                &["collaborator"]
            )
            .expect("Failed to register collaborator_errors_total"),
        }
    }
}

/// Handle to the process-global metrics.
///
/// Clones share the same underlying Prometheus series.
#[derive(Clone)]
pub struct ManagerMetrics {
    _private: (),
}

impl Default for ManagerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ManagerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ManagerMetricsInner {
        GLOBAL_METRICS.get_or_init(ManagerMetricsInner::new)
    }

    pub fn observe_request_latency(&self, operation: &str, duration_secs: f64) {
        self.inner()
            .request_latency_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn inc_lifecycle_command(&self, command: &str, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.inner()
            .lifecycle_commands
            .with_label_values(&[command, outcome])
            .inc();
    }

    pub fn inc_containers_deleted(&self) {
        self.inner().containers_deleted.inc();
    }

    pub fn set_managed_containers(&self, count: i64) {
        self.inner().managed_containers.set(count);
    }

    pub fn inc_collaborator_errors(&self, collaborator: &str) {
        self.inner()
            .collaborator_errors
            .with_label_values(&[collaborator])
            .inc();
    }
}

/// Structured logger for control plane events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_lifecycle(&self, container_id: &str, name: &str, command: &str) {
        info!(
            event = "container_lifecycle",
            instance = %self.instance,
            container_id = %container_id,
            container_name = %name,
            command = %command,
            "Lifecycle command applied"
        );
    }

    pub fn log_deletion(&self, container_id: &str, name: &str, status: &str) {
        info!(
            event = "container_deleted",
            instance = %self.instance,
            container_id = %container_id,
            container_name = %name,
            status = %status,
            "Container removed"
        );
    }

    pub fn log_collaborator_failure(&self, collaborator: &str, error: &str) {
        warn!(
            event = "collaborator_failure",
            instance = %self.instance,
            collaborator = %collaborator,
            error = %error,
            "Collaborator call failed"
        );
    }

    pub fn log_startup(&self, version: &str, metrics_configured: bool, gated: bool) {
        info!(
            event = "manager_started",
            instance = %self.instance,
            version = %version,
            metrics_configured = metrics_configured,
            identity_gate = gated,
            "Container manager started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "manager_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Container manager shutting down"
        );
    }
}
