//! cAdvisor client and raw payload types
//!
//! Mirrors the subset of the cAdvisor v1.3 `/api/v1.3/docker` response the
//! delta computation needs. Unknown fields are ignored.

use super::MetricsSource;
use crate::error::{ManagerError, ManagerResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Entity key -> raw series
pub type RawPayload = HashMap<String, RawEntity>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEntity {
    #[serde(default)]
    pub aliases: Vec<String>,
    pub spec: RawSpec,
    #[serde(default)]
    pub stats: Vec<RawSample>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSpec {
    pub memory: RawMemorySpec,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMemorySpec {
    pub limit: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: String,
    pub cpu: RawCpu,
    pub memory: RawMemory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCpu {
    pub usage: RawCpuUsage,
}

/// Cumulative CPU time in nanoseconds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCpuUsage {
    pub total: u64,
    #[serde(default)]
    pub per_cpu_usage: Vec<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMemory {
    pub usage: u64,
}

const DOCKER_ENDPOINT: &str = "api/v1.3/docker";

/// HTTP client for a cAdvisor instance
pub struct CadvisorClient {
    client: Client,
    base_url: String,
}

impl CadvisorClient {
    /// Create a client for `base_url`, bounding every request by `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, DOCKER_ENDPOINT)
    }
}

#[async_trait]
impl MetricsSource for CadvisorClient {
    async fn fetch(&self) -> ManagerResult<RawPayload> {
        let url = self.endpoint();
        debug!(url = %url, "Fetching container metrics");

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Metrics collector unreachable");
            ManagerError::CollaboratorUnavailable(format!(
                "Could not get metrics from cAdvisor: {e}"
            ))
        })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(url = %url, status = %status, "Metrics collector returned an error");
            return Err(ManagerError::CollaboratorUnavailable(format!(
                "Could not get metrics from cAdvisor (status {})",
                status.as_u16()
            )));
        }

        response
            .json::<RawPayload>()
            .await
            .map_err(|e| ManagerError::InvalidPayload(e.to_string()))
    }
}
