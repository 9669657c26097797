//! Container runtime collaborator
//!
//! The runtime is the sole source of truth for container state. This module
//! defines the runtime-neutral view the rest of the crate works with and the
//! trait each runtime backend implements. Docker (via bollard) is the only
//! backend shipped.

mod docker;

pub use docker::DockerRuntime;

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Failure reported by a container runtime call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("no such container: {0}")]
    NotFound(String),

    #[error("{0}")]
    Api(String),

    #[error("runtime request timed out")]
    Timeout,

    #[error("cannot reach container runtime: {0}")]
    Connection(String),
}

/// One host-side binding of an exposed container port
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HostBinding {
    pub host_ip: Option<String>,
    pub host_port: Option<String>,
}

/// Snapshot of a container as reported by the runtime
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuntimeContainer {
    pub id: String,
    pub name: String,
    /// Raw runtime state (`running`, `exited`, ...)
    pub status: String,
    pub exit_code: i64,
    pub labels: HashMap<String, String>,
    /// Container port (e.g. `80/tcp`) -> host bindings, `None` when unbound
    pub ports: HashMap<String, Option<Vec<HostBinding>>>,
    /// Creation timestamp as provided by the runtime (RFC 3339-ish)
    pub created: String,
}

/// Operations the control plane needs from a container runtime
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Check that the runtime answers at all
    async fn ping(&self) -> Result<(), RuntimeError>;

    /// List containers in every state carrying `label_filter` (`key=value`)
    async fn list(&self, label_filter: &str) -> Result<Vec<RuntimeContainer>, RuntimeError>;

    /// Inspect a container by id or name; `Ok(None)` if it does not exist
    async fn inspect(&self, id: &str) -> Result<Option<RuntimeContainer>, RuntimeError>;

    async fn start(&self, id: &str) -> Result<(), RuntimeError>;

    async fn stop(&self, id: &str) -> Result<(), RuntimeError>;

    async fn pause(&self, id: &str) -> Result<(), RuntimeError>;

    async fn unpause(&self, id: &str) -> Result<(), RuntimeError>;

    /// Permanently remove a container
    async fn remove(&self, id: &str) -> Result<(), RuntimeError>;

    /// Timestamped log output bounded by epoch-second `since`/`until`
    async fn logs(
        &self,
        id: &str,
        since: Option<i64>,
        until: Option<i64>,
    ) -> Result<String, RuntimeError>;
}
