//! Deterministic stand-ins for the external capabilities, used by unit tests.

use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use homeguard_core::{Host, Port};
use tokio::net::TcpListener;

use crate::discovery::LocalAddressSource;
use crate::error::{ProbeError, Result};
use crate::firewall::{FirewallInspector, FirewallVerdict};
use crate::notify::Notifier;
use crate::port::PortProbe;
use crate::reachability::PingRunner;

/// A loopback port with nothing listening on it.
pub async fn closed_local_port() -> Port {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Port::new(port).unwrap()
}

/// Answers pings from a fixed set of hosts and remembers who was pinged.
#[derive(Default)]
pub struct FakePing {
    up: HashSet<Host>,
    pinged: Mutex<Vec<Host>>,
}

impl FakePing {
    pub fn up(hosts: &[&str]) -> Self {
        Self {
            up: hosts.iter().map(|h| h.parse().unwrap()).collect(),
            pinged: Mutex::new(Vec::new()),
        }
    }

    pub fn pinged(&self) -> Vec<Host> {
        self.pinged.lock().unwrap().clone()
    }
}

impl PingRunner for FakePing {
    async fn ping(&self, host: Host) -> bool {
        self.pinged.lock().unwrap().push(host);
        self.up.contains(&host)
    }
}

/// Returns a fixed verdict and counts how often it was asked.
pub struct CountingFirewall {
    verdict: FirewallVerdict,
    calls: AtomicUsize,
}

impl CountingFirewall {
    pub fn new(verdict: FirewallVerdict) -> Self {
        Self {
            verdict,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FirewallInspector for CountingFirewall {
    async fn inspect(&self, _port: Port) -> FirewallVerdict {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
    }
}

/// Reports a fixed set of open ports without touching the network.
pub struct FakeProbe {
    open: HashSet<u16>,
    calls: Mutex<Vec<(Port, Duration)>>,
}

impl FakeProbe {
    pub fn open_on(ports: &[u16]) -> Self {
        Self {
            open: ports.iter().copied().collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Port> {
        self.calls.lock().unwrap().iter().map(|(p, _)| *p).collect()
    }

    pub fn timeouts(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

impl PortProbe for FakeProbe {
    async fn probe_port(&self, _host: Host, port: Port, timeout: Duration) -> bool {
        self.calls.lock().unwrap().push((port, timeout));
        self.open.contains(&port.get())
    }
}

pub struct FixedAddress(pub Ipv4Addr);

impl LocalAddressSource for FixedAddress {
    async fn local_ipv4(&self) -> Result<Ipv4Addr> {
        Ok(self.0)
    }
}

pub struct FailingAddress;

impl LocalAddressSource for FailingAddress {
    async fn local_ipv4(&self) -> Result<Ipv4Addr> {
        Err(ProbeError::LocalAddress("no network".to_string()))
    }
}

/// Records every delivery; optionally fails for one recipient.
#[derive(Default)]
pub struct RecordingNotifier {
    fail_for: Option<String>,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn failing_for(recipient: &str) -> Self {
        Self {
            fail_for: Some(recipient.to_string()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, recipient: &str, message: &str) -> Result<()> {
        if self.fail_for.as_deref() == Some(recipient) {
            return Err(ProbeError::Notify {
                recipient: recipient.to_string(),
                reason: "unreachable".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipient.to_string(), message.to_string()));
        Ok(())
    }
}
