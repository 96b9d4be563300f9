//! homeguard-history: Tamper-evident alert history.
//!
//! Every alert raised by a probe run is sealed into an [`AlertRecord`]
//! carrying a BLAKE3 hash of its content, then written to an
//! [`store::AlertStore`]. Reads re-verify the hash so edited records are
//! detected instead of silently reported.
//!
//! The crate also keeps the registry of people who opted in to alerts.

pub mod hash;
pub mod recipients;
pub mod stats;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use homeguard_core::alerts::{Alert, AlertId};

/// A persisted alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRecord {
    /// The alert as raised.
    pub alert: Alert,
    /// When the record was written.
    pub recorded_at: DateTime<Utc>,
    /// BLAKE3 content hash (hex) over `alert` and `recorded_at`.
    pub content_hash: String,
}

impl AlertRecord {
    /// Stamp and hash an alert for storage.
    pub fn seal(alert: Alert) -> Self {
        let recorded_at = Utc::now();
        let content_hash = hash::compute_record_hash(&alert, &recorded_at);
        Self {
            alert,
            recorded_at,
            content_hash,
        }
    }

    pub fn id(&self) -> AlertId {
        self.alert.id
    }

    /// Compute the BLAKE3 hash of the record's content.
    pub fn compute_hash(&self) -> String {
        hash::compute_record_hash(&self.alert, &self.recorded_at)
    }

    /// Verify that the stored content_hash matches a freshly computed hash.
    pub fn verify_integrity(&self) -> bool {
        self.content_hash == self.compute_hash()
    }
}
