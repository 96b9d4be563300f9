//! homeguard-core: Shared types and error handling for homeguard.
//!
//! This crate provides the foundational types used by the probing and
//! history crates:
//! - Validated `Host` / `Port` inputs
//! - The well-known service table and per-probe result types
//! - Alerts and the rules that classify probe outcomes into alerts
//! - Input validation errors

pub mod alerts;
pub mod error;
pub mod types;

pub use error::CoreError;
pub use types::{DiscoveryResult, Host, Port, PortStatus, ProbeResult, ServiceTable, SweepResult};
