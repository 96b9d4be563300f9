//! Alert storage: the store trait and a file-backed implementation.
//!
//! Records are stored as JSON files organized by the alert's date and ID.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use homeguard_core::alerts::{AlertId, AlertKind};
use homeguard_core::Host;

use crate::AlertRecord;

/// Errors that can occur during alert and recipient storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Alert not found: {0}")]
    NotFound(AlertId),

    #[error("Integrity check failed for alert {0}: stored hash does not match content")]
    IntegrityViolation(AlertId),

    #[error("Invalid recipient: {0:?}")]
    InvalidRecipient(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Query parameters for listing alerts.
#[derive(Debug, Default, Clone)]
pub struct AlertQuery {
    /// Filter by alert kind.
    pub kind: Option<AlertKind>,
    /// Filter by host.
    pub host: Option<Host>,
    /// Only include alerts raised at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Only include alerts raised at or before this time.
    pub to: Option<DateTime<Utc>>,
    /// Keep at most this many (newest) alerts.
    pub limit: Option<usize>,
}

/// Trait for alert persistence backends.
pub trait AlertStore {
    /// Store a sealed record.
    fn save(&self, record: &AlertRecord) -> Result<(), StoreError>;

    /// Retrieve a record by alert ID, verifying integrity.
    fn get(&self, id: AlertId) -> Result<AlertRecord, StoreError>;

    /// List records matching the query, newest alert first.
    ///
    /// Records that do not parse or fail the integrity check are skipped
    /// with a warning.
    fn list(&self, query: &AlertQuery) -> Result<Vec<AlertRecord>, StoreError>;
}

/// File-system backed alert store.
///
/// ```text
/// {root}/
///   2026/
///     10/
///       16/
///         {alert_id}.json
/// ```
pub struct FileAlertStore {
    root: PathBuf,
}

impl FileAlertStore {
    /// Create a new store rooted at the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, record: &AlertRecord) -> PathBuf {
        let date = record.alert.timestamp.format("%Y/%m/%d");
        self.root.join(format!("{}/{}.json", date, record.id().0))
    }

    fn find_path(&self, id: AlertId) -> Result<PathBuf, StoreError> {
        let filename = format!("{}.json", id.0);
        find_file_recursive(&self.root, &filename).ok_or(StoreError::NotFound(id))
    }
}

impl AlertStore for FileAlertStore {
    fn save(&self, record: &AlertRecord) -> Result<(), StoreError> {
        let path = self.record_path(record);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)?;

        tracing::debug!(
            alert_id = %record.id(),
            kind = %record.alert.kind,
            path = %path.display(),
            "Alert saved"
        );

        Ok(())
    }

    fn get(&self, id: AlertId) -> Result<AlertRecord, StoreError> {
        let path = self.find_path(id)?;
        let json = fs::read_to_string(&path)?;
        let record: AlertRecord = serde_json::from_str(&json)?;

        if !record.verify_integrity() {
            return Err(StoreError::IntegrityViolation(id));
        }

        Ok(record)
    }

    fn list(&self, query: &AlertQuery) -> Result<Vec<AlertRecord>, StoreError> {
        let mut results = Vec::new();
        collect_records_recursive(&self.root, query, &mut results)?;

        results.sort_by(|a, b| b.alert.timestamp.cmp(&a.alert.timestamp));
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }

        Ok(results)
    }
}

/// Recursively find a file by name.
fn find_file_recursive(dir: &Path, filename: &str) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file_recursive(&path, filename) {
                return Some(found);
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(filename) {
            return Some(path);
        }
    }

    None
}

fn collect_records_recursive(
    dir: &Path,
    query: &AlertQuery,
    results: &mut Vec<AlertRecord>,
) -> Result<(), StoreError> {
    if !dir.is_dir() {
        return Ok(());
    }

    let entries = fs::read_dir(dir)?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_records_recursive(&path, query, results)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let json = fs::read_to_string(&path)?;
            let record: AlertRecord = match serde_json::from_str(&json) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable alert record"
                    );
                    continue;
                }
            };

            if !record.verify_integrity() {
                tracing::warn!(
                    alert_id = %record.id(),
                    path = %path.display(),
                    "Skipping alert record with mismatched content hash"
                );
                continue;
            }

            if matches_query(&record, query) {
                results.push(record);
            }
        }
    }

    Ok(())
}

fn matches_query(record: &AlertRecord, query: &AlertQuery) -> bool {
    let alert = &record.alert;
    if let Some(kind) = &query.kind {
        if &alert.kind != kind {
            return false;
        }
    }
    if let Some(host) = &query.host {
        if &alert.host != host {
            return false;
        }
    }
    if let Some(from) = &query.from {
        if &alert.timestamp < from {
            return false;
        }
    }
    if let Some(to) = &query.to {
        if &alert.timestamp > to {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use homeguard_core::alerts::Alert;
    use homeguard_core::Port;

    fn open_port_alert(host: &str, port: u16) -> Alert {
        let host: Host = host.parse().unwrap();
        Alert::new(
            AlertKind::PortOpen,
            host,
            Some(Port::new(port).unwrap()),
            Some("SSH (secure remote access)".to_string()),
            format!("Port {port} is open on {host}"),
        )
    }

    #[test]
    fn test_save_and_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAlertStore::new(dir.path()).unwrap();
        let record = AlertRecord::seal(open_port_alert("10.0.0.2", 22));
        let id = record.id();

        store.save(&record).unwrap();
        let retrieved = store.get(id).unwrap();

        assert_eq!(retrieved, record);
        assert!(retrieved.verify_integrity());
    }

    #[test]
    fn test_missing_alert_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAlertStore::new(dir.path()).unwrap();
        let result = store.get(AlertId::new());
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_integrity_violation_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAlertStore::new(dir.path()).unwrap();
        let record = AlertRecord::seal(open_port_alert("10.0.0.2", 22));
        let id = record.id();
        store.save(&record).unwrap();

        let path = store.find_path(id).unwrap();
        let mut tampered: AlertRecord =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        tampered.alert.port = Some(Port::new(80).unwrap());
        fs::write(&path, serde_json::to_string_pretty(&tampered).unwrap()).unwrap();

        assert!(matches!(
            store.get(id),
            Err(StoreError::IntegrityViolation(_))
        ));
        assert!(store.list(&AlertQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_list_skips_unparseable_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAlertStore::new(dir.path()).unwrap();
        let record = AlertRecord::seal(open_port_alert("10.0.0.2", 22));
        store.save(&record).unwrap();
        fs::write(dir.path().join("partial.json"), r#"{"alert":"#).unwrap();

        let results = store.list(&AlertQuery::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id(), record.id());
    }

    #[test]
    fn test_list_filters_and_orders_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAlertStore::new(dir.path()).unwrap();

        let mut older = open_port_alert("10.0.0.2", 22);
        older.timestamp -= TimeDelta::try_hours(2).unwrap();
        let newer = open_port_alert("10.0.0.2", 3389);
        let other_host = open_port_alert("10.0.0.3", 22);
        let unreachable = Alert::host_unreachable("10.0.0.2".parse().unwrap(), None);

        for alert in [older, newer, other_host, unreachable] {
            store.save(&AlertRecord::seal(alert)).unwrap();
        }

        let query = AlertQuery {
            kind: Some(AlertKind::PortOpen),
            host: Some("10.0.0.2".parse().unwrap()),
            ..Default::default()
        };
        let results = store.list(&query).unwrap();
        let ports: Vec<u16> = results
            .iter()
            .map(|r| r.alert.port.unwrap().get())
            .collect();
        assert_eq!(ports, vec![3389, 22]);

        let limited = store
            .list(&AlertQuery {
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_list_respects_time_window() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileAlertStore::new(dir.path()).unwrap();

        let mut old = open_port_alert("10.0.0.2", 21);
        old.timestamp -= TimeDelta::try_days(3).unwrap();
        store.save(&AlertRecord::seal(old)).unwrap();
        store
            .save(&AlertRecord::seal(open_port_alert("10.0.0.2", 22)))
            .unwrap();

        let query = AlertQuery {
            from: Some(Utc::now() - TimeDelta::try_days(1).unwrap()),
            ..Default::default()
        };
        let results = store.list(&query).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].alert.port.unwrap().get(), 22);
    }
}
