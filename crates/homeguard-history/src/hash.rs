//! BLAKE3 content hashing for tamper evidence.
//!
//! The hash covers every field of the alert plus the recording time, so a
//! record edited on disk no longer matches its stored hash.

use chrono::{DateTime, Utc};
use serde::Serialize;

use homeguard_core::alerts::Alert;

/// Hashable representation of a record (excludes content_hash).
#[derive(Serialize)]
struct HashableRecord<'a> {
    alert: &'a Alert,
    recorded_at: &'a DateTime<Utc>,
}

/// Serialize the record content to canonical JSON and hash it with BLAKE3.
/// Returns the hex-encoded hash.
pub fn compute_record_hash(alert: &Alert, recorded_at: &DateTime<Utc>) -> String {
    let hashable = HashableRecord { alert, recorded_at };

    let json = serde_json::to_vec(&hashable).expect("Alert serialization should not fail");
    blake3::hash(&json).to_hex().to_string()
}
