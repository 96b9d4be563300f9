//! Aggregate counts over stored alerts.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use homeguard_core::alerts::AlertKind;
use homeguard_core::Host;

use crate::AlertRecord;

/// Number of hosts listed in [`AlertStats::top_hosts`].
pub const TOP_HOSTS: usize = 5;
/// Number of most recent days kept in [`AlertStats::by_day`].
pub const RECENT_DAYS: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AlertStats {
    pub total: usize,
    pub by_kind: BTreeMap<AlertKind, usize>,
    /// Hosts with the most alerts, highest count first. Ties break on address.
    pub top_hosts: Vec<(Host, usize)>,
    /// Alert counts for the most recent days that have any alerts.
    pub by_day: BTreeMap<NaiveDate, usize>,
}

impl AlertStats {
    pub fn from_records(records: &[AlertRecord]) -> Self {
        let mut by_kind = BTreeMap::new();
        let mut per_host: HashMap<Host, usize> = HashMap::new();
        let mut by_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();

        for record in records {
            let alert = &record.alert;
            *by_kind.entry(alert.kind).or_insert(0) += 1;
            *per_host.entry(alert.host).or_insert(0) += 1;
            *by_day.entry(alert.timestamp.date_naive()).or_insert(0) += 1;
        }

        let mut top_hosts: Vec<(Host, usize)> = per_host.into_iter().collect();
        top_hosts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        top_hosts.truncate(TOP_HOSTS);

        while by_day.len() > RECENT_DAYS {
            by_day.pop_first();
        }

        Self {
            total: records.len(),
            by_kind,
            top_hosts,
            by_day,
        }
    }
}
