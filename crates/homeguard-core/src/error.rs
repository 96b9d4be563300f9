use thiserror::Error;

/// Input validation errors.
///
/// These are raised before any socket is opened; probe outcomes never
/// surface as a `CoreError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid IPv4 address: {input:?}")]
    InvalidHost { input: String },

    #[error("Invalid port {input:?}: {reason}")]
    InvalidPort { input: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, CoreError>;
