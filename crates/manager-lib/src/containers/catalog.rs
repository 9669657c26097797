//! Managed container listing and lookup

use crate::error::{ManagerError, ManagerResult};
use crate::models::ManagedContainer;
use crate::runtime::{ContainerRuntime, HostBinding, RuntimeContainer};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// Label marking a container as managed by this control plane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipMarker {
    key: String,
}

impl OwnershipMarker {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Runtime label filter selecting managed containers
    pub fn filter(&self) -> String {
        format!("{}=true", self.key)
    }

    pub fn is_marked(&self, labels: &HashMap<String, String>) -> bool {
        labels.get(&self.key).map(|v| v == "true").unwrap_or(false)
    }
}

impl Default for OwnershipMarker {
    fn default() -> Self {
        Self::new("managed")
    }
}

/// Read-only view over the managed containers of a runtime.
///
/// Nothing is cached: every call goes back to the runtime.
#[derive(Clone)]
pub struct ContainerCatalog {
    runtime: Arc<dyn ContainerRuntime>,
    marker: OwnershipMarker,
}

impl ContainerCatalog {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, marker: OwnershipMarker) -> Self {
        Self { runtime, marker }
    }

    pub fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    /// List managed containers in every lifecycle state
    pub async fn list(&self) -> ManagerResult<Vec<ManagedContainer>> {
        let containers = self.runtime.list(&self.marker.filter()).await?;

        Ok(containers
            .into_iter()
            // The runtime filter is trusted but not relied upon
            .filter(|c| self.marker.is_marked(&c.labels))
            .map(to_managed)
            .collect())
    }

    /// Resolve a managed container by id or name.
    ///
    /// Unknown ids and unmanaged containers both yield `NotFound` so callers
    /// cannot learn that an unmanaged container exists.
    pub async fn get_owned(&self, id: &str) -> ManagerResult<ManagedContainer> {
        let container = match self.runtime.inspect(id).await? {
            Some(container) => container,
            None => {
                debug!(container_id = %id, "Container not found in runtime");
                return Err(ManagerError::NotFound);
            }
        };

        if !self.marker.is_marked(&container.labels) {
            debug!(container_id = %id, "Container lacks ownership label");
            return Err(ManagerError::NotFound);
        }

        Ok(to_managed(container))
    }
}

/// An unparseable creation timestamp is reported as epoch 0
fn to_managed(container: RuntimeContainer) -> ManagedContainer {
    let created_at = parse_created(&container.created).unwrap_or_else(|| {
        warn!(
            container_id = %container.id,
            created = %container.created,
            "Invalid creation timestamp"
        );
        0
    });

    ManagedContainer {
        short_id: container.id.chars().take(12).collect(),
        ports: parse_ports(&container.ports),
        id: container.id,
        name: container.name,
        raw_status: container.status,
        exit_code: container.exit_code,
        created_at,
    }
}

/// Keep only container ports with at least one host port bound
pub fn parse_ports(
    ports: &HashMap<String, Option<Vec<HostBinding>>>,
) -> BTreeMap<String, Vec<String>> {
    ports
        .iter()
        .filter_map(|(container_port, bindings)| {
            let host_ports: Vec<String> = bindings
                .as_deref()
                .unwrap_or_default()
                .iter()
                .filter_map(|b| b.host_port.clone())
                .collect();

            if host_ports.is_empty() {
                None
            } else {
                Some((container_port.clone(), host_ports))
            }
        })
        .collect()
}

/// Creation timestamp truncated to whole seconds, as epoch seconds (UTC)
pub fn parse_created(created: &str) -> Option<i64> {
    let whole_seconds = created.get(..19)?;
    NaiveDateTime::parse_from_str(whole_seconds, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}
