//! TCP connect port probing.
//!
//! A probe connects to `host:port` under a timeout and, if the connection is
//! accepted, writes a line terminator to it. Refusals, timeouts, unreachable
//! networks and every other socket error collapse to "closed": the probe
//! never fails. A false negative on a flaky network is the accepted price of
//! that.
//!
//! A failed write is only treated as suspicious on loopback, where a local
//! firewall can let the handshake through while dropping data. In that case
//! the [`FirewallInspector`] decides; anywhere else the port stays open.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use homeguard_core::{Host, Port, ProbeResult};

use crate::config::ProbeConfig;
use crate::firewall::{FirewallInspector, FirewallVerdict};

/// Default per-probe connect timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Bytes written to an accepted connection to confirm it takes data.
const POKE: &[u8] = b"\r\n";

/// What happened at the socket level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// Refused, timed out, unreachable, or any other connect error.
    Failed,
    /// Accepted and the benign write went through.
    Writable,
    /// Accepted but the benign write failed or timed out.
    WriteFailed,
}

/// Anything that can answer "is this port open?" without failing.
pub trait PortProbe {
    fn probe_port(
        &self,
        host: Host,
        port: Port,
        timeout: Duration,
    ) -> impl Future<Output = bool> + Send;
}

/// Full TCP connect prober.
#[derive(Debug, Clone)]
pub struct PortProber<F> {
    firewall: F,
    write_timeout: Duration,
}

impl<F: FirewallInspector + Sync> PortProber<F> {
    pub fn new(firewall: F, write_timeout: Duration) -> Self {
        Self {
            firewall,
            write_timeout,
        }
    }

    pub fn from_config(firewall: F, config: &ProbeConfig) -> Self {
        Self::new(firewall, config.write_timeout())
    }

    /// Probe and wrap the answer in a [`ProbeResult`].
    pub async fn probe(&self, host: Host, port: Port, connect_timeout: Duration) -> ProbeResult {
        let open = self.probe_port(host, port, connect_timeout).await;
        ProbeResult { host, port, open }
    }

    /// Turn a socket-level outcome into the final open/closed answer.
    pub async fn resolve(&self, host: Host, port: Port, outcome: ConnectOutcome) -> bool {
        match outcome {
            ConnectOutcome::Failed => false,
            ConnectOutcome::Writable => true,
            ConnectOutcome::WriteFailed if host.is_loopback() => {
                tracing::debug!(host = %host, port = port.get(), "Write failed on loopback, checking firewall");
                self.firewall.inspect(port).await == FirewallVerdict::NotBlocked
            }
            ConnectOutcome::WriteFailed => true,
        }
    }
}

impl<F: FirewallInspector + Sync> PortProbe for PortProber<F> {
    async fn probe_port(&self, host: Host, port: Port, connect_timeout: Duration) -> bool {
        let addr = SocketAddr::from((host.addr(), port.get()));
        let outcome = connect_and_poke(addr, connect_timeout, self.write_timeout).await;
        let open = self.resolve(host, port, outcome).await;

        tracing::debug!(host = %host, port = port.get(), ?outcome, open, "Port probe");
        open
    }
}

async fn connect_and_poke(
    addr: SocketAddr,
    connect_timeout: Duration,
    write_timeout: Duration,
) -> ConnectOutcome {
    let mut stream = match timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::trace!(%addr, error = %e, "Connect failed");
            return ConnectOutcome::Failed;
        }
        Err(_) => {
            tracing::trace!(%addr, "Connect timed out");
            return ConnectOutcome::Failed;
        }
    };

    let write = timeout(write_timeout, async {
        stream.write_all(POKE).await?;
        stream.flush().await
    })
    .await;

    match write {
        Ok(Ok(())) => ConnectOutcome::Writable,
        Ok(Err(e)) => {
            tracing::trace!(%addr, error = %e, "Write after connect failed");
            ConnectOutcome::WriteFailed
        }
        Err(_) => ConnectOutcome::WriteFailed,
    }
}
