//! Firewall heuristic for loopback false positives.
//!
//! A local packet filter can let the kernel accept a loopback connection
//! while the first write fails. When that happens the port prober asks a
//! [`FirewallInspector`] whether a deny rule covers the port.
//!
//! This is a best-effort heuristic, not a guarantee: it depends on `ufw` and
//! `iptables` being present, on non-interactive `sudo`, and on their output
//! format. Every failure reads as [`FirewallVerdict::NotBlocked`], which keeps
//! the port reported as open.

use std::future::Future;
use std::time::Duration;

use homeguard_core::Port;

use crate::config::ProbeConfig;
use crate::exec::run_with_timeout;

/// Whether a local firewall rule denies traffic to a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallVerdict {
    Blocked,
    NotBlocked,
}

/// Inspects the local packet filter for deny rules.
pub trait FirewallInspector {
    fn inspect(&self, port: Port) -> impl Future<Output = FirewallVerdict> + Send;
}

/// Reads `ufw status` and `iptables -L -n` through `sudo -n`.
///
/// Only meaningful on Linux; elsewhere every port is `NotBlocked`.
#[derive(Debug, Clone)]
pub struct SystemFirewallInspector {
    timeout: Duration,
    use_sudo: bool,
}

impl SystemFirewallInspector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            use_sudo: true,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.firewall_timeout())
    }

    /// Call the tools directly instead of through `sudo -n`.
    pub fn without_sudo(mut self) -> Self {
        self.use_sudo = false;
        self
    }

    async fn tool_output(&self, tool: &str, args: &[&str]) -> Option<String> {
        let (program, argv) = if self.use_sudo {
            let mut argv = vec!["-n".to_string(), tool.to_string()];
            argv.extend(args.iter().map(|a| a.to_string()));
            ("sudo", argv)
        } else {
            (tool, args.iter().map(|a| a.to_string()).collect())
        };

        let output = run_with_timeout(program, &argv, self.timeout).await?;
        if !output.status.success() {
            tracing::debug!(tool, code = ?output.status.code(), "Firewall tool failed");
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for SystemFirewallInspector {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

impl FirewallInspector for SystemFirewallInspector {
    async fn inspect(&self, port: Port) -> FirewallVerdict {
        if !cfg!(target_os = "linux") {
            return FirewallVerdict::NotBlocked;
        }

        if let Some(status) = self.tool_output("ufw", &["status"]).await {
            if ufw_denies(&status, port) {
                tracing::info!(port = port.get(), source = "ufw", "Port blocked by firewall");
                return FirewallVerdict::Blocked;
            }
        }

        if let Some(rules) = self.tool_output("iptables", &["-L", "-n"]).await {
            if iptables_denies(&rules, port) {
                tracing::info!(port = port.get(), source = "iptables", "Port blocked by firewall");
                return FirewallVerdict::Blocked;
            }
        }

        FirewallVerdict::NotBlocked
    }
}

/// True if `ufw status` output holds a DENY or REJECT rule for `port`.
///
/// The rule target must name the port exactly (`22`, `22/tcp`), as part of a
/// list (`22,80/tcp`) or inside a range (`20:25/tcp`). UDP-only rules and
/// rules for other ports are ignored.
pub fn ufw_denies(status: &str, port: Port) -> bool {
    status.lines().any(|line| {
        let mut tokens = line.split_whitespace();
        let Some(target) = tokens.next() else {
            return false;
        };
        let action = tokens.find(|t| *t != "(v6)");
        let denies = matches!(action, Some(a) if a.eq_ignore_ascii_case("DENY") || a.eq_ignore_ascii_case("REJECT"));

        denies && ufw_target_covers(target, port)
    })
}

fn ufw_target_covers(target: &str, port: Port) -> bool {
    let ports = match target.split_once('/') {
        Some((ports, proto)) if proto.eq_ignore_ascii_case("tcp") => ports,
        Some(_) => return false,
        None => target,
    };
    ports.split(',').any(|item| range_covers(item, ':', port))
}

/// True if `iptables -L -n` output holds a DROP or REJECT rule whose
/// destination port (`dpt:N`) or range (`dpts:A:B`) covers `port`.
pub fn iptables_denies(rules: &str, port: Port) -> bool {
    rules.lines().any(|line| {
        let mut tokens = line.split_whitespace();
        let denies = matches!(tokens.next(), Some("DROP") | Some("REJECT"));
        denies
            && tokens.any(|t| {
                if let Some(single) = t.strip_prefix("dpt:") {
                    single.parse::<u16>().ok() == Some(port.get())
                } else if let Some(range) = t.strip_prefix("dpts:") {
                    range_covers(range, ':', port)
                } else {
                    false
                }
            })
    })
}

/// `"22"` or `"20:25"` (with `sep` between the range ends).
fn range_covers(range: &str, sep: char, port: Port) -> bool {
    let p = port.get();
    match range.split_once(sep) {
        Some((lo, hi)) => match (lo.parse::<u16>(), hi.parse::<u16>()) {
            (Ok(lo), Ok(hi)) => (lo..=hi).contains(&p),
            _ => false,
        },
        None => range.parse::<u16>().ok() == Some(p),
    }
}
