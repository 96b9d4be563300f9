//! Core domain types for home network probing.
//!
//! Hosts and ports are validated at construction so that the probers only
//! ever see well-formed input. Result types are plain values: nothing here is
//! mutated after a probe call hands it back.

use std::borrow::Cow;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

// ── Host ──────────────────────────────────────────────────────────

/// An IPv4 host in dotted-quad form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Host(Ipv4Addr);

impl Host {
    /// `127.0.0.1`.
    pub const LOOPBACK: Host = Host(Ipv4Addr::LOCALHOST);

    pub const fn new(addr: Ipv4Addr) -> Self {
        Self(addr)
    }

    pub const fn addr(&self) -> Ipv4Addr {
        self.0
    }

    /// True for any address in `127.0.0.0/8`.
    pub fn is_loopback(&self) -> bool {
        self.0.is_loopback()
    }
}

impl FromStr for Host {
    type Err = CoreError;

    /// Only literal IPv4 addresses are accepted; hostnames are rejected.
    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<Ipv4Addr>()
            .map(Host)
            .map_err(|_| CoreError::InvalidHost {
                input: s.to_string(),
            })
    }
}

impl TryFrom<String> for Host {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Host> for String {
    fn from(host: Host) -> Self {
        host.to_string()
    }
}

impl From<Ipv4Addr> for Host {
    fn from(addr: Ipv4Addr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ── Port ──────────────────────────────────────────────────────────

/// A TCP port in `1..=65535`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    pub fn new(number: u16) -> Result<Self> {
        if number == 0 {
            return Err(CoreError::InvalidPort {
                input: number.to_string(),
                reason: "port 0 is reserved",
            });
        }
        Ok(Self(number))
    }

    /// Build a port from a constant known to be non-zero.
    const fn known(number: u16) -> Self {
        assert!(number != 0, "port 0 is reserved");
        Self(number)
    }

    pub const fn get(self) -> u16 {
        self.0
    }
}

impl FromStr for Port {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason| CoreError::InvalidPort {
            input: s.to_string(),
            reason,
        };

        let value: u64 = s.trim().parse().map_err(|_| invalid("not a number"))?;
        match value {
            0 => Err(invalid("port 0 is reserved")),
            1..=65535 => Ok(Self(value as u16)),
            _ => Err(invalid("must be between 1 and 65535")),
        }
    }
}

impl TryFrom<u16> for Port {
    type Error = CoreError;

    fn try_from(value: u16) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ── Service table ─────────────────────────────────────────────────

/// Label for ports that are not in the service table.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// One row of the service table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub port: Port,
    pub name: Cow<'static, str>,
}

impl ServiceEntry {
    pub const fn known(port: u16, name: &'static str) -> Self {
        Self {
            port: Port::known(port),
            name: Cow::Borrowed(name),
        }
    }
}

/// The default common-port table, in sweep order.
pub const COMMON_SERVICES: [ServiceEntry; 9] = [
    ServiceEntry::known(21, "FTP"),
    ServiceEntry::known(22, "SSH"),
    ServiceEntry::known(23, "Telnet"),
    ServiceEntry::known(25, "SMTP"),
    ServiceEntry::known(53, "DNS"),
    ServiceEntry::known(80, "HTTP"),
    ServiceEntry::known(443, "HTTPS"),
    ServiceEntry::known(3306, "MySQL"),
    ServiceEntry::known(3389, "RDP"),
];

/// Ordered port → service-name lookup.
///
/// Definition order is the sweep order. Duplicate ports keep their first
/// occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTable {
    entries: Vec<ServiceEntry>,
}

impl ServiceTable {
    pub fn new(entries: impl IntoIterator<Item = ServiceEntry>) -> Self {
        let mut deduped: Vec<ServiceEntry> = Vec::new();
        for entry in entries {
            if !deduped.iter().any(|e| e.port == entry.port) {
                deduped.push(entry);
            }
        }
        Self { entries: deduped }
    }

    /// The built-in table of nine well-known services.
    pub fn common() -> Self {
        Self::new(COMMON_SERVICES)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.iter()
    }

    pub fn ports(&self) -> impl Iterator<Item = Port> + '_ {
        self.entries.iter().map(|e| e.port)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Short service label, or [`UNKNOWN_SERVICE`].
    pub fn name(&self, port: Port) -> &str {
        self.entries
            .iter()
            .find(|e| e.port == port)
            .map(|e| e.name.as_ref())
            .unwrap_or(UNKNOWN_SERVICE)
    }

    /// Label plus a short explanation for the well-known ports,
    /// e.g. `"Telnet (insecure remote terminal)"`.
    pub fn describe(&self, port: Port) -> String {
        let name = self.name(port);
        match well_known_purpose(port.get()) {
            Some(purpose) => format!("{name} ({purpose})"),
            None => name.to_string(),
        }
    }
}

impl Default for ServiceTable {
    fn default() -> Self {
        Self::common()
    }
}

fn well_known_purpose(port: u16) -> Option<&'static str> {
    match port {
        21 => Some("file transfer"),
        22 => Some("secure remote access"),
        23 => Some("insecure remote terminal"),
        25 => Some("mail transfer"),
        53 => Some("name resolution"),
        80 => Some("web server"),
        443 => Some("secure web server"),
        3306 => Some("database"),
        3389 => Some("remote desktop"),
        _ => None,
    }
}

// ── Probe results ─────────────────────────────────────────────────

/// Outcome of a single port probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub host: Host,
    pub port: Port,
    pub open: bool,
}

/// One row of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortStatus {
    pub port: Port,
    pub open: bool,
}

/// Ordered port → open map produced by a sweep.
///
/// Rows stay in the order they were recorded, which is the service table
/// order. Recording the same port twice overwrites the earlier row in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepResult {
    pub host: Host,
    entries: Vec<PortStatus>,
}

impl SweepResult {
    pub fn new(host: Host) -> Self {
        Self {
            host,
            entries: Vec::new(),
        }
    }

    pub fn record(&mut self, port: Port, open: bool) {
        match self.entries.iter_mut().find(|e| e.port == port) {
            Some(existing) => existing.open = open,
            None => self.entries.push(PortStatus { port, open }),
        }
    }

    pub fn get(&self, port: Port) -> Option<bool> {
        self.entries.iter().find(|e| e.port == port).map(|e| e.open)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortStatus> {
        self.entries.iter()
    }

    pub fn ports(&self) -> impl Iterator<Item = Port> + '_ {
        self.entries.iter().map(|e| e.port)
    }

    pub fn open_ports(&self) -> impl Iterator<Item = Port> + '_ {
        self.entries.iter().filter(|e| e.open).map(|e| e.port)
    }

    pub fn open_count(&self) -> usize {
        self.entries.iter().filter(|e| e.open).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered, duplicate-free list of hosts found by discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    hosts: Vec<Host>,
}

impl DiscoveryResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `host` unless it is already present. Returns whether it was added.
    pub fn push_unique(&mut self, host: Host) -> bool {
        if self.hosts.contains(&host) {
            return false;
        }
        self.hosts.push(host);
        true
    }

    pub fn contains(&self, host: &Host) -> bool {
        self.hosts.contains(host)
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn iter(&self) -> impl Iterator<Item = &Host> {
        self.hosts.iter()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn into_hosts(self) -> Vec<Host> {
        self.hosts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_accepts_dotted_quad() {
        let host: Host = "192.168.1.10".parse().unwrap();
        assert_eq!(host.addr(), Ipv4Addr::new(192, 168, 1, 10));
        assert_eq!(host.to_string(), "192.168.1.10");
        assert!(!host.is_loopback());
        assert!(Host::LOOPBACK.is_loopback());
    }

    #[test]
    fn test_host_rejects_malformed_input() {
        for input in ["", "localhost", "192.168.1", "192.168.1.256", "1.2.3.4.5", "::1"] {
            let err = input.parse::<Host>().unwrap_err();
            assert!(matches!(err, CoreError::InvalidHost { .. }), "{input}");
        }
    }

    #[test]
    fn test_port_bounds() {
        assert_eq!("1".parse::<Port>().unwrap().get(), 1);
        assert_eq!("65535".parse::<Port>().unwrap().get(), 65535);
        assert_eq!(" 22 ".parse::<Port>().unwrap().get(), 22);

        for input in ["0", "65536", "ssh", "-1", ""] {
            let err = input.parse::<Port>().unwrap_err();
            assert!(matches!(err, CoreError::InvalidPort { .. }), "{input}");
        }
        assert!(Port::new(0).is_err());
    }

    #[test]
    fn test_port_deserialize_rejects_zero() {
        assert!(serde_json::from_str::<Port>("0").is_err());
        assert_eq!(serde_json::from_str::<Port>("443").unwrap().get(), 443);
    }

    #[test]
    fn test_common_table_order_and_names() {
        let table = ServiceTable::common();
        let ports: Vec<u16> = table.ports().map(Port::get).collect();
        assert_eq!(ports, vec![21, 22, 23, 25, 53, 80, 443, 3306, 3389]);

        assert_eq!(table.name(Port::new(3389).unwrap()), "RDP");
        assert_eq!(table.name(Port::new(8080).unwrap()), UNKNOWN_SERVICE);
        assert_eq!(
            table.describe(Port::new(23).unwrap()),
            "Telnet (insecure remote terminal)"
        );
        assert_eq!(table.describe(Port::new(8080).unwrap()), "unknown");
    }

    #[test]
    fn test_service_table_keeps_first_duplicate() {
        let table = ServiceTable::new([
            ServiceEntry::known(8080, "HTTP-Alt"),
            ServiceEntry::known(22, "SSH"),
            ServiceEntry::known(8080, "Proxy"),
        ]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.name(Port::new(8080).unwrap()), "HTTP-Alt");
    }

    #[test]
    fn test_sweep_result_preserves_record_order() {
        let mut sweep = SweepResult::new(Host::LOOPBACK);
        for (p, open) in [(3389, true), (21, false), (22, true)] {
            sweep.record(Port::new(p).unwrap(), open);
        }
        sweep.record(Port::new(21).unwrap(), true);

        let order: Vec<u16> = sweep.ports().map(Port::get).collect();
        assert_eq!(order, vec![3389, 21, 22]);
        assert_eq!(sweep.open_count(), 3);
        assert_eq!(sweep.get(Port::new(21).unwrap()), Some(true));
        assert_eq!(sweep.get(Port::new(80).unwrap()), None);
    }

    #[test]
    fn test_discovery_result_suppresses_duplicates() {
        let mut result = DiscoveryResult::new();
        assert!(result.push_unique(Host::LOOPBACK));
        assert!(result.push_unique("10.0.0.5".parse().unwrap()));
        assert!(!result.push_unique(Host::LOOPBACK));
        assert_eq!(result.len(), 2);
        assert_eq!(result.hosts()[0], Host::LOOPBACK);
    }

    #[test]
    fn test_sweep_result_serializes_hosts_as_strings() {
        let mut sweep = SweepResult::new("10.0.0.1".parse().unwrap());
        sweep.record(Port::new(22).unwrap(), true);
        let json = serde_json::to_string(&sweep).unwrap();
        assert!(json.contains("\"host\":\"10.0.0.1\""));
        assert!(json.contains("\"port\":22"));
    }
}
