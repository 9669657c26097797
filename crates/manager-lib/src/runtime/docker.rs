//! Docker backend for the container runtime trait

use super::{ContainerRuntime, HostBinding, RuntimeContainer, RuntimeError};
use async_trait::async_trait;
use bollard::container::{
    InspectContainerOptions, ListContainersOptions, LogsOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::models::ContainerInspectResponse;
use bollard::Docker;
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Container runtime backed by the local Docker Engine API
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using the platform defaults (`DOCKER_HOST` or the local
    /// socket). Every request is bounded by `timeout`.
    pub fn connect(timeout: Duration) -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(map_error)?
            .with_timeout(timeout);

        Ok(Self { docker })
    }

    fn convert(response: ContainerInspectResponse) -> RuntimeContainer {
        let (status, exit_code) = response
            .state
            .map(|state| {
                (
                    state.status.map(|s| s.to_string()).unwrap_or_default(),
                    state.exit_code.unwrap_or(0),
                )
            })
            .unwrap_or_default();

        let labels = response
            .config
            .and_then(|config| config.labels)
            .unwrap_or_default();

        let ports = response
            .network_settings
            .and_then(|settings| settings.ports)
            .unwrap_or_default()
            .into_iter()
            .map(|(port, bindings)| {
                let bindings = bindings.map(|list| {
                    list.into_iter()
                        .map(|b| HostBinding {
                            host_ip: b.host_ip,
                            host_port: b.host_port,
                        })
                        .collect()
                });
                (port, bindings)
            })
            .collect();

        RuntimeContainer {
            id: response.id.unwrap_or_default(),
            name: response
                .name
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_default(),
            status,
            exit_code,
            labels,
            ports,
            created: response.created.unwrap_or_default(),
        }
    }
}

fn map_error(err: BollardError) -> RuntimeError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404,
            message,
        } => RuntimeError::NotFound(message),
        BollardError::DockerResponseServerError { message, .. } => RuntimeError::Api(message),
        BollardError::RequestTimeoutError => RuntimeError::Timeout,
        other => RuntimeError::Connection(other.to_string()),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker.ping().await.map_err(map_error)?;
        Ok(())
    }

    async fn list(&self, label_filter: &str) -> Result<Vec<RuntimeContainer>, RuntimeError> {
        let mut filters = HashMap::new();
        filters.insert("label".to_string(), vec![label_filter.to_string()]);

        let options = ListContainersOptions::<String> {
            all: true,
            filters,
            ..Default::default()
        };

        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(map_error)?;

        // Summaries lack exit codes and the full port table, so each
        // container is inspected to get the same snapshot `inspect` returns.
        let mut containers = Vec::with_capacity(summaries.len());
        for id in summaries.into_iter().filter_map(|s| s.id) {
            match self.inspect(&id).await? {
                Some(container) => containers.push(container),
                None => debug!(container_id = %id, "Container vanished while listing"),
            }
        }

        Ok(containers)
    }

    async fn inspect(&self, id: &str) -> Result<Option<RuntimeContainer>, RuntimeError> {
        match self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
        {
            Ok(response) => Ok(Some(Self::convert(response))),
            Err(e) => match map_error(e) {
                RuntimeError::NotFound(_) => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn start(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(map_error)
    }

    async fn stop(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker
            .stop_container(id, None::<StopContainerOptions>)
            .await
            .map_err(map_error)
    }

    async fn pause(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker.pause_container(id).await.map_err(map_error)
    }

    async fn unpause(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker.unpause_container(id).await.map_err(map_error)
    }

    async fn remove(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker
            .remove_container(id, None::<RemoveContainerOptions>)
            .await
            .map_err(map_error)
    }

    async fn logs(
        &self,
        id: &str,
        since: Option<i64>,
        until: Option<i64>,
    ) -> Result<String, RuntimeError> {
        // Docker treats 0 as "unbounded" for both ends of the window
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            timestamps: true,
            since: since.unwrap_or(0),
            until: until.unwrap_or(0),
            tail: "all".to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.logs(id, Some(options));
        let mut output = String::new();

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(log) => output.push_str(&log.to_string()),
                Err(e) => {
                    warn!(container_id = %id, error = %e, "Error reading container logs");
                    return Err(map_error(e));
                }
            }
        }

        Ok(output)
    }
}
