//! Probe workflows: reachability gate → probe → classify → persist → notify.
//!
//! The probers hand back booleans; the monitor is the collaborator that turns
//! them into alerts, writes them to the history store, and pushes a summary
//! to every recipient. Storage and delivery problems are logged and never
//! change the probe outcome.

use std::sync::Arc;

use homeguard_core::alerts::{self, Alert};
use homeguard_core::{Host, Port, ProbeResult, ServiceTable, SweepResult};
use homeguard_history::recipients::{FileRecipientRegistry, RecipientRegistry};
use homeguard_history::store::{AlertStore, FileAlertStore};
use homeguard_history::AlertRecord;

use crate::config::{AppConfig, ProbeConfig};
use crate::error::Result;
use crate::firewall::{FirewallInspector, SystemFirewallInspector};
use crate::limiter::FixedDelayLimiter;
use crate::notify::{broadcast, Notifier, TracingNotifier};
use crate::port::PortProber;
use crate::reachability::{PingRunner, ReachabilityProber, SystemPing};
use crate::sweep::CommonPortSweep;

/// What a check produced.
#[derive(Debug, Clone)]
pub enum CheckOutcome<T> {
    /// The host failed its reachability check; nothing was probed.
    Unreachable { alert: Alert },
    /// The host was probed.
    Checked { result: T, alerts: Vec<Alert> },
}

impl<T> CheckOutcome<T> {
    pub fn alerts(&self) -> &[Alert] {
        match self {
            Self::Unreachable { alert } => std::slice::from_ref(alert),
            Self::Checked { alerts, .. } => alerts,
        }
    }

    pub fn result(&self) -> Option<&T> {
        match self {
            Self::Unreachable { .. } => None,
            Self::Checked { result, .. } => Some(result),
        }
    }
}

/// Build the sweep the way the configuration describes it.
pub fn build_sweep<F>(firewall: F, config: &ProbeConfig) -> CommonPortSweep<PortProber<F>>
where
    F: FirewallInspector + Sync,
{
    CommonPortSweep::new(
        PortProber::from_config(firewall, config),
        config.service_table(),
        config.connect_timeout(),
        FixedDelayLimiter::new(config.inter_probe_delay()),
    )
}

pub struct Monitor<P, F, N> {
    reachability: ReachabilityProber<P>,
    sweep: CommonPortSweep<PortProber<F>>,
    store: Arc<dyn AlertStore + Send + Sync>,
    notifier: N,
    recipients: Vec<String>,
    registry: Option<Arc<dyn RecipientRegistry + Send + Sync>>,
}

/// A monitor wired to the real `ping`, firewall tools, and log delivery.
pub type SystemMonitor = Monitor<SystemPing, SystemFirewallInspector, TracingNotifier>;

impl SystemMonitor {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store = FileAlertStore::new(&config.history.dir)?;
        let recipients = if config.notify.enabled {
            config.notify.recipients.clone()
        } else {
            Vec::new()
        };

        let monitor = Monitor::new(
            ReachabilityProber::new(SystemPing::from_config(&config.probe)),
            build_sweep(SystemFirewallInspector::from_config(&config.probe), &config.probe),
            Arc::new(store),
            TracingNotifier,
            recipients,
        );
        if !config.notify.enabled {
            return Ok(monitor);
        }
        let registry = FileRecipientRegistry::new(&config.notify.registry_file);
        Ok(monitor.with_registry(Arc::new(registry)))
    }
}

impl<P, F, N> Monitor<P, F, N>
where
    P: PingRunner + Sync,
    F: FirewallInspector + Sync,
    N: Notifier + Sync,
{
    pub fn new(
        reachability: ReachabilityProber<P>,
        sweep: CommonPortSweep<PortProber<F>>,
        store: Arc<dyn AlertStore + Send + Sync>,
        notifier: N,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            reachability,
            sweep,
            store,
            notifier,
            recipients,
            registry: None,
        }
    }

    /// Also notify everyone in `registry`, read afresh on every dispatch.
    pub fn with_registry(mut self, registry: Arc<dyn RecipientRegistry + Send + Sync>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn reachability(&self) -> &ReachabilityProber<P> {
        &self.reachability
    }

    pub fn services(&self) -> &ServiceTable {
        self.sweep.services()
    }

    /// Ping the host, then sweep its common ports.
    pub async fn check_host_and_sweep(&self, host: Host) -> CheckOutcome<SweepResult> {
        if !self.reachability.is_reachable(host).await {
            tracing::warn!(host = %host, "Host not reachable, skipping sweep");
            let alert = Alert::host_unreachable(host, None);
            self.dispatch(host, std::slice::from_ref(&alert)).await;
            return CheckOutcome::Unreachable { alert };
        }

        let result = self.sweep.sweep_common_ports(host).await;
        let alerts = alerts::classify_sweep(&result, self.services());
        self.dispatch(host, &alerts).await;

        CheckOutcome::Checked { result, alerts }
    }

    /// Ping the host, then probe a single port.
    pub async fn check_port(&self, host: Host, port: Port) -> CheckOutcome<ProbeResult> {
        if !self.reachability.is_reachable(host).await {
            tracing::warn!(host = %host, port = port.get(), "Host not reachable, skipping probe");
            let alert = Alert::host_unreachable(host, Some(port));
            self.dispatch(host, std::slice::from_ref(&alert)).await;
            return CheckOutcome::Unreachable { alert };
        }

        let result = self
            .sweep
            .prober()
            .probe(host, port, self.sweep.probe_timeout())
            .await;
        tracing::info!(host = %host, port = port.get(), open = result.open, "Port checked");

        let alerts = alerts::classify_probe(&result, self.services());
        if !alerts.is_empty() {
            self.dispatch(host, &alerts).await;
        }

        CheckOutcome::Checked { result, alerts }
    }

    /// Persist each alert and notify recipients with one combined message.
    async fn dispatch(&self, host: Host, alerts: &[Alert]) {
        for alert in alerts {
            let record = AlertRecord::seal(alert.clone());
            if let Err(e) = self.store.save(&record) {
                tracing::error!(alert_id = %alert.id, error = %e, "Failed to store alert");
            }
        }

        let recipients = self.all_recipients();
        if recipients.is_empty() {
            return;
        }

        let message = alerts::summarize(host, alerts);
        let delivered = broadcast(&self.notifier, &recipients, &message).await;
        tracing::info!(
            host = %host,
            alerts = alerts.len(),
            delivered,
            recipients = recipients.len(),
            "Alerts dispatched"
        );
    }

    /// Configured recipients first, then registered ones, without repeats.
    /// An unreadable registry leaves only the configured recipients.
    fn all_recipients(&self) -> Vec<String> {
        let mut recipients = self.recipients.clone();
        let Some(registry) = &self.registry else {
            return recipients;
        };

        match registry.list() {
            Ok(registrations) => {
                for registration in registrations {
                    if !recipients.contains(&registration.recipient) {
                        recipients.push(registration.recipient);
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to read recipient registry"),
        }
        recipients
    }
}
