//! Alerts raised from probe outcomes.
//!
//! The probers only report booleans. This module turns those booleans into
//! human-facing alerts that the history store persists and the notifier
//! pushes to recipients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Host, Port, ProbeResult, ServiceTable, SweepResult};

/// Unique identifier for an alert.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AlertId(pub Uuid);

impl AlertId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlertId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AlertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What an alert is about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// A probed port accepted a connection.
    PortOpen,
    /// An open port runs a service that is risky to expose.
    InsecureService,
    /// The host did not answer the reachability check.
    HostUnreachable,
    /// A sweep finished with every port closed.
    NoOpenPorts,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PortOpen => "port_open",
            Self::InsecureService => "insecure_service",
            Self::HostUnreachable => "host_unreachable",
            Self::NoOpenPorts => "no_open_ports",
        }
    }
}

impl std::str::FromStr for AlertKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "port_open" => Ok(Self::PortOpen),
            "insecure_service" => Ok(Self::InsecureService),
            "host_unreachable" => Ok(Self::HostUnreachable),
            "no_open_ports" => Ok(Self::NoOpenPorts),
            other => Err(format!(
                "Unknown alert kind: {other}. Choose: port_open, insecure_service, host_unreachable, no_open_ports"
            )),
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single security alert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: AlertId,
    pub timestamp: DateTime<Utc>,
    pub kind: AlertKind,
    pub host: Host,
    pub port: Option<Port>,
    pub service: Option<String>,
    pub message: String,
}

impl Alert {
    pub fn new(
        kind: AlertKind,
        host: Host,
        port: Option<Port>,
        service: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: AlertId::new(),
            timestamp: Utc::now(),
            kind,
            host,
            port,
            service,
            message: message.into(),
        }
    }

    /// The host failed its reachability check before a probe of `port`
    /// (or before a sweep when `port` is `None`).
    pub fn host_unreachable(host: Host, port: Option<Port>) -> Self {
        let message = match port {
            Some(port) => format!("Host {host} is not reachable; port {port} was not checked"),
            None => format!("Host {host} is not reachable; common ports were not swept"),
        };
        Self::new(AlertKind::HostUnreachable, host, port, None, message)
    }
}

/// Warning text for services that should not be exposed on a home network.
pub fn insecure_service_warning(port: Port) -> Option<&'static str> {
    match port.get() {
        23 => Some("Telnet is not secure; use SSH instead"),
        3389 => Some("RDP is a frequent attack target; protect it with a strong password"),
        _ => None,
    }
}

fn open_port_alerts(host: Host, port: Port, services: &ServiceTable) -> Vec<Alert> {
    let service = services.describe(port);
    let mut alerts = vec![Alert::new(
        AlertKind::PortOpen,
        host,
        Some(port),
        Some(service.clone()),
        format!("Port {port} ({service}) is open on {host}"),
    )];

    if let Some(warning) = insecure_service_warning(port) {
        alerts.push(Alert::new(
            AlertKind::InsecureService,
            host,
            Some(port),
            Some(service),
            format!("Port {port} open on {host}: {warning}"),
        ));
    }

    alerts
}

/// Alerts for a finished sweep, in table order.
///
/// Every open port yields a `PortOpen` alert, followed directly by an
/// `InsecureService` alert when the port is risky. A sweep with nothing open
/// yields a single `NoOpenPorts` alert.
pub fn classify_sweep(sweep: &SweepResult, services: &ServiceTable) -> Vec<Alert> {
    let alerts: Vec<Alert> = sweep
        .open_ports()
        .flat_map(|port| open_port_alerts(sweep.host, port, services))
        .collect();

    if alerts.is_empty() {
        return vec![Alert::new(
            AlertKind::NoOpenPorts,
            sweep.host,
            None,
            None,
            format!("No common ports open on {}", sweep.host),
        )];
    }

    alerts
}

/// Alerts for a single port probe. A closed port raises nothing.
pub fn classify_probe(result: &ProbeResult, services: &ServiceTable) -> Vec<Alert> {
    if !result.open {
        return Vec::new();
    }
    open_port_alerts(result.host, result.port, services)
}

/// Join alerts into one notification body.
pub fn summarize(host: Host, alerts: &[Alert]) -> String {
    let mut lines = vec![format!("Security report for {host}:")];
    lines.extend(alerts.iter().map(|a| format!("- {}", a.message)));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(n: u16) -> Port {
        Port::new(n).unwrap()
    }

    fn sweep_with_open(host: Host, open: &[u16]) -> SweepResult {
        let table = ServiceTable::common();
        let mut sweep = SweepResult::new(host);
        for p in table.ports() {
            sweep.record(p, open.contains(&p.get()));
        }
        sweep
    }

    #[test]
    fn test_ssh_and_rdp_open_flags_rdp() {
        let host: Host = "192.168.0.20".parse().unwrap();
        let sweep = sweep_with_open(host, &[22, 3389]);
        let alerts = classify_sweep(&sweep, &ServiceTable::common());

        let kinds: Vec<(AlertKind, u16)> = alerts
            .iter()
            .map(|a| (a.kind, a.port.unwrap().get()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (AlertKind::PortOpen, 22),
                (AlertKind::PortOpen, 3389),
                (AlertKind::InsecureService, 3389),
            ]
        );
        assert_eq!(
            alerts[1].service.as_deref(),
            Some("RDP (remote desktop)")
        );
    }

    #[test]
    fn test_telnet_is_flagged() {
        let result = ProbeResult {
            host: Host::LOOPBACK,
            port: port(23),
            open: true,
        };
        let alerts = classify_probe(&result, &ServiceTable::common());
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[1].kind, AlertKind::InsecureService);
        assert!(alerts[1].message.contains("SSH"));
    }

    #[test]
    fn test_closed_probe_raises_nothing() {
        let result = ProbeResult {
            host: Host::LOOPBACK,
            port: port(3389),
            open: false,
        };
        assert!(classify_probe(&result, &ServiceTable::common()).is_empty());
    }

    #[test]
    fn test_quiet_sweep_yields_no_open_ports() {
        let sweep = sweep_with_open(Host::LOOPBACK, &[]);
        let alerts = classify_sweep(&sweep, &ServiceTable::common());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::NoOpenPorts);
        assert!(alerts[0].port.is_none());
    }

    #[test]
    fn test_unknown_port_uses_unknown_label() {
        let result = ProbeResult {
            host: Host::LOOPBACK,
            port: port(8080),
            open: true,
        };
        let alerts = classify_probe(&result, &ServiceTable::common());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].service.as_deref(), Some("unknown"));
    }

    #[test]
    fn test_alert_kind_parses_and_serializes_snake_case() {
        assert_eq!("port-open".parse::<AlertKind>().unwrap(), AlertKind::PortOpen);
        assert!("bogus".parse::<AlertKind>().is_err());

        let json = serde_json::to_string(&AlertKind::HostUnreachable).unwrap();
        assert_eq!(json, "\"host_unreachable\"");
    }

    #[test]
    fn test_summary_lists_every_alert() {
        let host = Host::LOOPBACK;
        let alerts = vec![Alert::host_unreachable(host, Some(port(80)))];
        let body = summarize(host, &alerts);
        assert!(body.starts_with("Security report for 127.0.0.1:"));
        assert!(body.contains("port 80 was not checked"));
    }
}
