//! Managed container operations
//!
//! This module provides the container-facing components of the control
//! plane. All of them resolve containers through the [`ContainerCatalog`],
//! which only ever exposes containers bearing the ownership label.

mod catalog;
mod lifecycle;
mod logs;

#[cfg(test)]
mod tests;

pub use catalog::{parse_created, parse_ports, ContainerCatalog, OwnershipMarker};
pub use lifecycle::LifecycleGuard;
pub use logs::{split_log_lines, LogWindow};
