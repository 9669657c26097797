//! Container manager server
//!
//! HTTP control plane over the managed containers of the local container
//! runtime. The core logic lives in `manager-lib`; this crate wires it to
//! configuration and an axum router.

pub mod api;
pub mod config;
