//! Watch-mode scheduling.
//!
//! Spawns one tokio task per enabled watch target, each sweeping its host at
//! the configured interval. A semaphore caps how many sweeps run at once.
//! Each host gets one sequential loop (repeated targets keep the first
//! entry), so a host is never swept concurrently with itself.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::config::{WatchConfig, WatchTarget};
use crate::firewall::FirewallInspector;
use crate::monitor::{CheckOutcome, Monitor};
use crate::notify::Notifier;
use crate::reachability::PingRunner;

pub struct WatchScheduler<P, F, N> {
    config: WatchConfig,
    monitor: Arc<Monitor<P, F, N>>,
    concurrency: Arc<Semaphore>,
}

impl<P, F, N> WatchScheduler<P, F, N>
where
    P: PingRunner + Send + Sync + 'static,
    F: FirewallInspector + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub fn new(config: WatchConfig, monitor: Monitor<P, F, N>) -> Self {
        let concurrency = Arc::new(Semaphore::new(config.effective_concurrency()));
        Self {
            config,
            monitor: Arc::new(monitor),
            concurrency,
        }
    }

    /// Run until every target task ends, which in practice is until the
    /// runtime shuts down.
    pub async fn run(&self) {
        let mut handles = Vec::new();
        let mut scheduled = HashSet::new();

        for target in &self.config.targets {
            if !target.enabled {
                tracing::info!(host = %target.host, "Watch target disabled, skipping");
                continue;
            }
            if !scheduled.insert(target.host) {
                tracing::warn!(host = %target.host, "Duplicate watch target, skipping");
                continue;
            }

            let monitor = self.monitor.clone();
            let semaphore = self.concurrency.clone();
            let target = target.clone();

            let handle = tokio::spawn(async move {
                run_target_loop(monitor, target, semaphore).await;
            });
            handles.push(handle);
        }

        tracing::info!(
            targets = handles.len(),
            max_concurrent = self.config.effective_concurrency(),
            "Watch scheduler started"
        );

        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Watch task panicked");
            }
        }
    }
}

async fn run_target_loop<P, F, N>(
    monitor: Arc<Monitor<P, F, N>>,
    target: WatchTarget,
    semaphore: Arc<Semaphore>,
) where
    P: PingRunner + Sync,
    F: FirewallInspector + Sync,
    N: Notifier + Sync,
{
    let mut ticker = interval(Duration::from_secs(target.interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Ok(_permit) = semaphore.acquire().await else {
            tracing::warn!(host = %target.host, "Scheduler shut down");
            return;
        };

        tracing::info!(host = %target.host, "Scheduled sweep triggered");
        match monitor.check_host_and_sweep(target.host).await {
            CheckOutcome::Checked { result, alerts } => tracing::info!(
                host = %target.host,
                open = result.open_count(),
                alerts = alerts.len(),
                "Scheduled sweep complete"
            ),
            CheckOutcome::Unreachable { .. } => {
                tracing::warn!(host = %target.host, "Scheduled sweep skipped, host unreachable")
            }
        }
    }
}
