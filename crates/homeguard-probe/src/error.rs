//! Error types for the homeguard-probe crate.
//!
//! Probe outcomes are never errors: `probe_port`, `is_reachable` and the
//! sweep always hand back booleans. Only discovery setup, input validation,
//! and the collaborators around the probers (history, config, notification)
//! fail through this type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Cannot resolve local IPv4 address: {0}")]
    LocalAddress(String),

    #[error(transparent)]
    Input(#[from] homeguard_core::CoreError),

    #[error("History error: {0}")]
    History(#[from] homeguard_history::store::StoreError),

    #[error("Notification to {recipient} failed: {reason}")]
    Notify { recipient: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ProbeError>;
