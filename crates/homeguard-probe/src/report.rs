//! Plain-text rendering of probe results and alert history for the CLI.

use std::fmt::Write;

use homeguard_core::{DiscoveryResult, ProbeResult, ServiceTable, SweepResult};
use homeguard_history::recipients::Registration;
use homeguard_history::stats::AlertStats;
use homeguard_history::AlertRecord;

use crate::monitor::CheckOutcome;

fn state(open: bool) -> &'static str {
    if open {
        "open"
    } else {
        "closed"
    }
}

pub fn discovery(result: &DiscoveryResult) -> String {
    let mut out = format!("Discovered {} host(s):\n", result.len());
    for host in result.iter() {
        let _ = writeln!(out, "  {host}");
    }
    out
}

pub fn sweep(outcome: &CheckOutcome<SweepResult>, services: &ServiceTable) -> String {
    let mut out = String::new();
    match outcome {
        CheckOutcome::Unreachable { alert } => {
            let _ = writeln!(out, "{}", alert.message);
        }
        CheckOutcome::Checked { result, alerts } => {
            let _ = writeln!(
                out,
                "{}: {} of {} common ports open",
                result.host,
                result.open_count(),
                result.len()
            );
            for status in result.iter() {
                let _ = writeln!(
                    out,
                    "  {:>5}  {:<6}  {}",
                    status.port,
                    state(status.open),
                    services.describe(status.port)
                );
            }
            push_alerts(&mut out, alerts);
        }
    }
    out
}

pub fn probe(outcome: &CheckOutcome<ProbeResult>, services: &ServiceTable) -> String {
    let mut out = String::new();
    match outcome {
        CheckOutcome::Unreachable { alert } => {
            let _ = writeln!(out, "{}", alert.message);
        }
        CheckOutcome::Checked { result, alerts } => {
            let _ = writeln!(
                out,
                "{}:{} is {} ({})",
                result.host,
                result.port,
                state(result.open),
                services.describe(result.port)
            );
            push_alerts(&mut out, alerts);
        }
    }
    out
}

fn push_alerts(out: &mut String, alerts: &[homeguard_core::alerts::Alert]) {
    if alerts.is_empty() {
        return;
    }
    let _ = writeln!(out, "Alerts:");
    for alert in alerts {
        let _ = writeln!(out, "  [{}] {}", alert.kind, alert.message);
    }
}

pub fn history(records: &[AlertRecord]) -> String {
    if records.is_empty() {
        return "No alerts recorded.\n".to_string();
    }
    let mut out = String::new();
    for record in records {
        let alert = &record.alert;
        let _ = writeln!(
            out,
            "{}  {:<16}  {:<15}  {}",
            alert.timestamp.format("%Y-%m-%d %H:%M:%S"),
            alert.kind,
            alert.host,
            alert.message
        );
    }
    out
}

pub fn stats(stats: &AlertStats) -> String {
    let mut out = format!("Total alerts: {}\n", stats.total);
    if stats.total == 0 {
        return out;
    }

    out.push_str("By kind:\n");
    for (kind, count) in &stats.by_kind {
        let _ = writeln!(out, "  {kind:<16}  {count}");
    }
    out.push_str("Top hosts:\n");
    for (host, count) in &stats.top_hosts {
        let _ = writeln!(out, "  {host:<15}  {count}");
    }
    out.push_str("Recent days:\n");
    for (day, count) in &stats.by_day {
        let _ = writeln!(out, "  {day}  {count}");
    }
    out
}

pub fn recipients(registrations: &[Registration]) -> String {
    if registrations.is_empty() {
        return "No recipients registered.\n".to_string();
    }
    let mut out = String::new();
    for registration in registrations {
        let _ = write!(out, "{}", registration.recipient);
        if let Some(name) = &registration.display_name {
            let _ = write!(out, " ({name})");
        }
        let _ = writeln!(
            out,
            "  since {}",
            registration.registered_at.format("%Y-%m-%d")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeguard_core::alerts::{self, Alert, AlertKind};
    use homeguard_core::{Host, Port};

    fn port(n: u16) -> Port {
        Port::new(n).unwrap()
    }

    #[test]
    fn test_discovery_lists_hosts_in_order() {
        let mut result = DiscoveryResult::new();
        result.push_unique(Host::LOOPBACK);
        result.push_unique("192.168.1.10".parse().unwrap());

        assert_eq!(
            discovery(&result),
            "Discovered 2 host(s):\n  127.0.0.1\n  192.168.1.10\n"
        );
    }

    #[test]
    fn test_sweep_shows_every_port_and_alerts() {
        let services = ServiceTable::common();
        let host: Host = "192.168.1.5".parse().unwrap();
        let mut result = SweepResult::new(host);
        for p in services.ports() {
            result.record(p, p.get() == 23);
        }
        let alerts = alerts::classify_sweep(&result, &services);
        let text = sweep(&CheckOutcome::Checked { result, alerts }, &services);

        assert!(text.starts_with("192.168.1.5: 1 of 9 common ports open\n"));
        assert!(text.contains("   23  open    Telnet (insecure remote terminal)"));
        assert!(text.contains("   22  closed  SSH"));
        assert!(text.contains("[insecure_service]"));
    }

    #[test]
    fn test_unreachable_prints_the_alert() {
        let alert = Alert::host_unreachable("10.0.0.9".parse().unwrap(), Some(port(80)));
        let expected = format!("{}\n", alert.message);
        let outcome: CheckOutcome<ProbeResult> = CheckOutcome::Unreachable { alert };
        assert_eq!(probe(&outcome, &ServiceTable::common()), expected);
    }

    #[test]
    fn test_closed_probe_has_no_alert_section() {
        let result = ProbeResult {
            host: Host::LOOPBACK,
            port: port(8080),
            open: false,
        };
        let text = probe(
            &CheckOutcome::Checked {
                result,
                alerts: Vec::new(),
            },
            &ServiceTable::common(),
        );
        assert_eq!(text, "127.0.0.1:8080 is closed (unknown)\n");
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(history(&[]), "No alerts recorded.\n");
        assert_eq!(stats(&AlertStats::default()), "Total alerts: 0\n");
    }

    #[test]
    fn test_recipients_listing() {
        assert_eq!(recipients(&[]), "No recipients registered.\n");

        let registered_at = "2026-10-01T08:00:00Z".parse().unwrap();
        let text = recipients(&[
            Registration {
                recipient: "1001".to_string(),
                display_name: Some("Alice".to_string()),
                registered_at,
                last_seen: registered_at,
            },
            Registration {
                recipient: "ops-channel".to_string(),
                display_name: None,
                registered_at,
                last_seen: registered_at,
            },
        ]);
        assert_eq!(
            text,
            "1001 (Alice)  since 2026-10-01\nops-channel  since 2026-10-01\n"
        );
    }

    #[test]
    fn test_stats_sections() {
        let host: Host = "192.168.1.5".parse().unwrap();
        let records = vec![
            AlertRecord::seal(Alert::new(AlertKind::PortOpen, host, Some(port(22)), None, "a")),
            AlertRecord::seal(Alert::new(AlertKind::PortOpen, host, Some(port(80)), None, "b")),
        ];
        let text = stats(&AlertStats::from_records(&records));

        assert!(text.starts_with("Total alerts: 2\nBy kind:\n  port_open"));
        assert!(text.contains("  192.168.1.5      2\n"));
    }
}
