//! Core library for the container manager control plane
//!
//! This crate provides the core functionality for:
//! - Normalizing container runtime states into logical statuses
//! - Listing managed containers and gating lifecycle commands
//! - Fetching bounded container log windows
//! - Turning cumulative metrics counters into utilization rates
//! - Identity verification, health checks and observability

pub mod auth;
pub mod containers;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod performance;
pub mod runtime;
pub mod status;

pub use error::{ManagerError, ManagerResult};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{ManagerMetrics, StructuredLogger};
pub use status::normalize;
