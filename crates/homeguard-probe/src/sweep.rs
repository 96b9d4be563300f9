//! Common-port sweep.
//!
//! Probes every port of the service table against one host, strictly one at
//! a time and in table order, pausing between probes. There is no early
//! exit: every table port is always probed.

use std::time::Duration;

use homeguard_core::{Host, ServiceTable, SweepResult};

use crate::limiter::{FixedDelayLimiter, RateLimiter};
use crate::port::PortProbe;

/// Drives a [`PortProbe`] across a [`ServiceTable`].
#[derive(Debug, Clone)]
pub struct CommonPortSweep<P, L = FixedDelayLimiter> {
    prober: P,
    services: ServiceTable,
    probe_timeout: Duration,
    limiter: L,
}

impl<P, L> CommonPortSweep<P, L>
where
    P: PortProbe + Sync,
    L: RateLimiter + Clone + Send + Sync,
{
    /// Each sweep paces itself with a fresh clone of `limiter`, so sweeps of
    /// different hosts do not slow each other down.
    pub fn new(prober: P, services: ServiceTable, probe_timeout: Duration, limiter: L) -> Self {
        Self {
            prober,
            services,
            probe_timeout,
            limiter,
        }
    }

    pub fn services(&self) -> &ServiceTable {
        &self.services
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// Never fails; the result holds exactly the table's ports, in table order.
    pub async fn sweep_common_ports(&self, host: Host) -> SweepResult {
        let mut limiter = self.limiter.clone();
        let mut result = SweepResult::new(host);

        tracing::info!(host = %host, ports = self.services.len(), "Sweeping common ports");

        for entry in self.services.iter() {
            limiter.wait_for_next().await;
            let open = self
                .prober
                .probe_port(host, entry.port, self.probe_timeout)
                .await;

            tracing::info!(
                host = %host,
                port = entry.port.get(),
                service = %entry.name,
                open,
                "Port checked"
            );
            result.record(entry.port, open);
        }

        tracing::info!(
            host = %host,
            open = result.open_count(),
            total = result.len(),
            "Sweep complete"
        );
        result
    }
}
