//! Manager configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Manager configuration, read from `MANAGER_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ManagerConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// Name attached to structured log events
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// Identity verifier base URL; the identity gate is off when unset
    #[serde(default)]
    pub identity_url: Option<String>,

    /// Group id verified users must belong to
    #[serde(default)]
    pub admin_gid: Option<String>,

    /// Metrics collector (cAdvisor) base URL
    #[serde(default)]
    pub metrics_url: Option<String>,

    /// Label key marking containers as managed
    #[serde(default = "default_managed_label")]
    pub managed_label: String,

    #[serde(default = "default_runtime_timeout")]
    pub runtime_timeout_secs: u64,

    #[serde(default = "default_collaborator_timeout")]
    pub collaborator_timeout_secs: u64,
}

fn default_api_port() -> u16 {
    8080
}

fn default_bind_address() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "container-manager".to_string())
}

fn default_managed_label() -> String {
    "managed".to_string()
}

fn default_runtime_timeout() -> u64 {
    30
}

fn default_collaborator_timeout() -> u64 {
    10
}

impl ManagerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("MANAGER"))
            .build()
            .context("reading MANAGER_* environment")?;

        Self::from_config(config)
    }

    /// Deserialize and normalize an already-built configuration
    pub fn from_config(config: config::Config) -> Result<Self> {
        let mut parsed: ManagerConfig = config
            .try_deserialize()
            .context("invalid manager configuration")?;

        parsed.identity_url = normalize_url(parsed.identity_url);
        parsed.metrics_url = normalize_url(parsed.metrics_url);
        parsed.admin_gid = parsed
            .admin_gid
            .map(|gid| gid.trim().to_string())
            .filter(|gid| !gid.is_empty());

        if parsed.managed_label.trim().is_empty() {
            anyhow::bail!("managed_label must not be empty");
        }

        Ok(parsed)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.api_port)
    }

    pub fn runtime_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime_timeout_secs)
    }

    pub fn collaborator_timeout(&self) -> Duration {
        Duration::from_secs(self.collaborator_timeout_secs)
    }
}

/// Strip trailing slashes; blank values count as unset
fn normalize_url(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
}
