//! Registered alert recipients.
//!
//! People opt in to alerts by registering an identifier the delivery channel
//! understands (a chat id, an address). Registrations live in a single JSON
//! file that is re-read on every dispatch, so a newly registered recipient
//! gets the next alert without a restart.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// One opted-in recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub recipient: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub registered_at: DateTime<Utc>,
    /// Last time the recipient registered again.
    pub last_seen: DateTime<Utc>,
}

/// Trait for recipient persistence backends.
pub trait RecipientRegistry {
    /// Register `recipient`. Returns `false` when it was already registered,
    /// in which case only `last_seen` (and a given display name) change.
    fn add(&self, recipient: &str, display_name: Option<&str>) -> Result<bool, StoreError>;

    /// Unregister `recipient`. Returns whether it was registered.
    fn remove(&self, recipient: &str) -> Result<bool, StoreError>;

    /// Every registration, oldest first.
    fn list(&self) -> Result<Vec<Registration>, StoreError>;
}

/// Registry kept in one JSON file. A missing file is an empty registry.
pub struct FileRecipientRegistry {
    path: PathBuf,
}

impl FileRecipientRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Registration>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write to a sibling temp file, then rename over the registry.
    fn persist(&self, registrations: &[Registration]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(registrations)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl RecipientRegistry for FileRecipientRegistry {
    fn add(&self, recipient: &str, display_name: Option<&str>) -> Result<bool, StoreError> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(StoreError::InvalidRecipient(recipient.to_string()));
        }

        let now = Utc::now();
        let mut registrations = self.load()?;
        let added = match registrations.iter_mut().find(|r| r.recipient == recipient) {
            Some(existing) => {
                existing.last_seen = now;
                if let Some(name) = display_name {
                    existing.display_name = Some(name.to_string());
                }
                false
            }
            None => {
                registrations.push(Registration {
                    recipient: recipient.to_string(),
                    display_name: display_name.map(str::to_string),
                    registered_at: now,
                    last_seen: now,
                });
                true
            }
        };

        self.persist(&registrations)?;
        tracing::info!(recipient, added, "Recipient registered");
        Ok(added)
    }

    fn remove(&self, recipient: &str) -> Result<bool, StoreError> {
        let recipient = recipient.trim();
        let mut registrations = self.load()?;
        let before = registrations.len();
        registrations.retain(|r| r.recipient != recipient);
        if registrations.len() == before {
            return Ok(false);
        }

        self.persist(&registrations)?;
        tracing::info!(recipient, "Recipient removed");
        Ok(true)
    }

    fn list(&self) -> Result<Vec<Registration>, StoreError> {
        self.load()
    }
}
