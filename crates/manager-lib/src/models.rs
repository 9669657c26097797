//! Core data models for the container manager

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Normalized lifecycle state exposed to API callers.
///
/// Runtime states without a dedicated variant are carried verbatim in
/// `Other` so that nothing the runtime reports is lost.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogicalStatus {
    Running,
    Stopped,
    Error,
    Processing,
    Paused,
    Other(String),
}

impl LogicalStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LogicalStatus::Running => "running",
            LogicalStatus::Stopped => "stopped",
            LogicalStatus::Error => "error",
            LogicalStatus::Processing => "processing",
            LogicalStatus::Paused => "paused",
            LogicalStatus::Other(raw) => raw,
        }
    }

    /// Whether a container in this state may be deleted
    pub fn is_terminal(&self) -> bool {
        matches!(self, LogicalStatus::Stopped | LogicalStatus::Error)
    }
}

impl From<String> for LogicalStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "running" => LogicalStatus::Running,
            "stopped" => LogicalStatus::Stopped,
            "error" => LogicalStatus::Error,
            "processing" => LogicalStatus::Processing,
            "paused" => LogicalStatus::Paused,
            _ => LogicalStatus::Other(value),
        }
    }
}

impl From<LogicalStatus> for String {
    fn from(status: LogicalStatus) -> Self {
        match status {
            LogicalStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LogicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle command accepted on `POST /containers/{id}/{command}/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleCommand {
    Start,
    Stop,
    Pause,
    Resume,
}

impl LifecycleCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleCommand::Start => "start",
            LifecycleCommand::Stop => "stop",
            LifecycleCommand::Pause => "pause",
            LifecycleCommand::Resume => "resume",
        }
    }
}

impl fmt::Display for LifecycleCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Command string that does not name a lifecycle command
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown lifecycle command: {0}")]
pub struct UnknownCommand(pub String);

impl FromStr for LifecycleCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(LifecycleCommand::Start),
            "stop" => Ok(LifecycleCommand::Stop),
            "pause" => Ok(LifecycleCommand::Pause),
            "resume" => Ok(LifecycleCommand::Resume),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

/// A container bearing the ownership label, as observed in the runtime
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedContainer {
    pub id: String,
    pub short_id: String,
    pub name: String,
    /// Raw runtime status (e.g. `exited`)
    pub raw_status: String,
    pub exit_code: i64,
    /// Container port -> host ports; ports without host bindings are absent
    pub ports: BTreeMap<String, Vec<String>>,
    /// Creation time, epoch seconds
    pub created_at: i64,
}

impl ManagedContainer {
    /// Logical status, recomputed from the raw state on every call
    pub fn status(&self) -> LogicalStatus {
        crate::status::normalize(&self.raw_status, self.exit_code)
    }

    pub fn summary(&self) -> ContainerSummary {
        ContainerSummary {
            id: self.id.clone(),
            id_short: self.short_id.clone(),
            name: self.name.clone(),
            status: self.status(),
            ports: self.ports.clone(),
            start_time: self.created_at,
        }
    }
}

/// Wire representation of a managed container in `GET /containers`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSummary {
    pub id: String,
    pub id_short: String,
    pub name: String,
    pub status: LogicalStatus,
    pub ports: BTreeMap<String, Vec<String>>,
    pub start_time: i64,
}

/// One utilization point derived from two consecutive raw samples.
///
/// `cpu` and `memory` are fractions; `None` marks a sample that cannot
/// produce a finite rate (zero or negative elapsed time, no cores, no limit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub timestamp: String,
    #[serde(rename = "CPU")]
    pub cpu: Option<f64>,
    #[serde(rename = "Memory")]
    pub memory: Option<f64>,
}

/// Per-entity output of the metrics delta computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPerformance {
    pub aliases: Vec<String>,
    pub stats: Vec<MetricPoint>,
}

/// Entity key -> utilization series
pub type PerformanceSnapshot = BTreeMap<String, EntityPerformance>;
