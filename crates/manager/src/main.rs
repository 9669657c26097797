//! Container Manager - HTTP control plane for managed containers
//!
//! Lists, starts, stops, pauses, resumes and deletes the containers carrying
//! the ownership label, serves their logs and reports utilization derived
//! from cAdvisor.

use anyhow::{Context, Result};
use container_manager::{api, config::ManagerConfig};
use manager_lib::{
    auth::{HttpIdentityVerifier, IdentityGate},
    containers::OwnershipMarker,
    health::{components, HealthRegistry},
    performance::{CadvisorClient, MetricsSource, PerformanceService},
    runtime::{ContainerRuntime, DockerRuntime},
    ManagerMetrics, StructuredLogger,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const MANAGER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting container-manager");

    let config = ManagerConfig::load()?;
    info!(
        instance = %config.instance_name,
        managed_label = %config.managed_label,
        "Manager configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::RUNTIME).await;
    health_registry.register(components::METRICS).await;
    health_registry.register(components::IDENTITY).await;

    let metrics = ManagerMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    let runtime = DockerRuntime::connect(config.runtime_timeout())
        .context("Failed to create Docker client")?;
    if let Err(e) = runtime.ping().await {
        warn!(error = %e, "Container runtime not reachable at startup");
        health_registry
            .set_unhealthy(components::RUNTIME, e.to_string())
            .await;
    }

    let source: Option<Arc<dyn MetricsSource>> = match &config.metrics_url {
        Some(url) => {
            let client: Arc<dyn MetricsSource> = Arc::new(
                CadvisorClient::new(url, config.collaborator_timeout())
                    .context("Failed to create metrics collector client")?,
            );
            Some(client)
        }
        None => {
            info!("No metrics collector configured, /performance will be empty");
            None
        }
    };

    let gate = match &config.identity_url {
        Some(url) => {
            let verifier = HttpIdentityVerifier::new(url, config.collaborator_timeout())
                .context("Failed to create identity verifier client")?;
            Some(IdentityGate::new(Arc::new(verifier), config.admin_gid.clone()))
        }
        None => {
            warn!("No identity verifier configured, container routes are not gated");
            None
        }
    };

    logger.log_startup(MANAGER_VERSION, source.is_some(), gate.is_some());

    let app_state = Arc::new(api::AppState::new(
        Arc::new(runtime),
        OwnershipMarker::new(config.managed_label.clone()),
        PerformanceService::new(source),
        gate,
        health_registry.clone(),
        metrics,
        logger.clone(),
    ));

    health_registry.set_ready(true).await;

    let shutdown_logger = logger.clone();
    api::serve(config.listen_addr(), app_state, async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        shutdown_logger.log_shutdown("SIGINT received");
    })
    .await?;

    info!("Shut down");
    Ok(())
}
