//! Resource utilization from the metrics collector
//!
//! The collector reports cumulative CPU and memory counters per monitored
//! entity. [`compute_rates`] turns those series into per-interval
//! utilization fractions; [`PerformanceService`] ties that computation to
//! an optional [`MetricsSource`].

mod cadvisor;
mod delta;

pub use cadvisor::{
    CadvisorClient, RawCpu, RawCpuUsage, RawEntity, RawMemory, RawMemorySpec, RawPayload,
    RawSample, RawSpec,
};
pub use delta::{compute_rates, elapsed_nanoseconds, parse_sample_timestamp};

use crate::error::ManagerResult;
use crate::models::PerformanceSnapshot;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of raw cumulative counter series
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch(&self) -> ManagerResult<RawPayload>;
}

/// Computes utilization snapshots from an optional metrics source
#[derive(Clone, Default)]
pub struct PerformanceService {
    source: Option<Arc<dyn MetricsSource>>,
}

impl PerformanceService {
    pub fn new(source: Option<Arc<dyn MetricsSource>>) -> Self {
        Self { source }
    }

    pub fn is_configured(&self) -> bool {
        self.source.is_some()
    }

    /// Current snapshot, or `None` when no collector is configured.
    ///
    /// An unconfigured collector is not an error; a configured one that
    /// cannot be reached is.
    pub async fn snapshot(&self) -> ManagerResult<Option<PerformanceSnapshot>> {
        let Some(source) = &self.source else {
            return Ok(None);
        };

        let payload = source.fetch().await?;
        compute_rates(payload).map(Some)
    }
}
