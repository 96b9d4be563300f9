//! homeguard-probe: network probing for home-network security monitoring.
//!
//! Answers whether a host responds to ping, whether a TCP port accepts
//! connections, which of a fixed set of common ports are open, and which
//! hosts on the local /24 are alive. Findings become alerts that are kept in
//! the history store and pushed to recipients.

pub mod config;
pub mod discovery;
pub mod error;
pub mod exec;
pub mod firewall;
pub mod limiter;
pub mod monitor;
pub mod notify;
pub mod port;
pub mod reachability;
pub mod report;
pub mod scheduler;
pub mod sweep;

#[cfg(test)]
mod testing;
