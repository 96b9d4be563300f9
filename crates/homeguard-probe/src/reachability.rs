//! Reachability checks via the platform ping utility.
//!
//! Raw ICMP sockets need elevated privileges, so the check shells out to
//! `ping` and trusts its exit status rather than parsing per-packet output.
//! Failure to run `ping` at all counts as unreachable.

use std::future::Future;
use std::time::Duration;

use homeguard_core::Host;

use crate::config::ProbeConfig;
use crate::exec::run_with_timeout;

/// Something that can send echo requests to a host.
pub trait PingRunner {
    /// True if the host answered. Must not fail and must not block longer
    /// than the runner's own bound.
    fn ping(&self, host: Host) -> impl Future<Output = bool> + Send;
}

/// Runs the system `ping` binary.
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
    count: u32,
    timeout: Duration,
}

impl SystemPing {
    pub fn new(count: u32, timeout: Duration) -> Self {
        Self {
            program: "ping".to_string(),
            count: count.max(1),
            timeout,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.ping_count, config.ping_timeout())
    }

    /// Use a different ping binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Arguments for one invocation: `-c N` on Unix, `-n N` on Windows.
    pub fn args(&self, host: Host) -> Vec<String> {
        let count_flag = if cfg!(windows) { "-n" } else { "-c" };
        vec![count_flag.to_string(), self.count.to_string(), host.to_string()]
    }
}

impl Default for SystemPing {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

impl PingRunner for SystemPing {
    async fn ping(&self, host: Host) -> bool {
        let args = self.args(host);
        match run_with_timeout(&self.program, &args, self.timeout).await {
            Some(output) => output.status.success(),
            None => false,
        }
    }
}

/// Determines whether hosts respond to echo requests.
#[derive(Debug, Clone, Default)]
pub struct ReachabilityProber<P> {
    runner: P,
}

impl<P: PingRunner> ReachabilityProber<P> {
    pub fn new(runner: P) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &P {
        &self.runner
    }

    /// Never fails: any problem running the check reads as unreachable.
    pub async fn is_reachable(&self, host: Host) -> bool {
        let reachable = self.runner.ping(host).await;
        tracing::debug!(host = %host, reachable, "Reachability check");
        reachable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakePing;

    #[test]
    fn test_sends_two_echo_requests_by_default() {
        let ping = SystemPing::default();
        let args = ping.args("10.0.0.1".parse().unwrap());
        assert_eq!(args[1], "2");
        assert_eq!(args[2], "10.0.0.1");
        if cfg!(windows) {
            assert_eq!(args[0], "-n");
        } else {
            assert_eq!(args[0], "-c");
        }
    }

    #[test]
    fn test_count_is_at_least_one() {
        let ping = SystemPing::new(0, Duration::from_secs(1));
        assert_eq!(ping.args(Host::LOOPBACK)[1], "1");
    }

    #[tokio::test]
    async fn test_missing_ping_binary_is_unreachable() {
        let prober = ReachabilityProber::new(
            SystemPing::default().with_program("homeguard-no-such-ping"),
        );
        assert!(!prober.is_reachable(Host::LOOPBACK).await);
    }

    #[tokio::test]
    async fn test_delegates_to_runner() {
        let prober = ReachabilityProber::new(FakePing::up(&["10.0.0.1"]));
        assert!(prober.is_reachable("10.0.0.1".parse().unwrap()).await);
        assert!(!prober.is_reachable("10.0.0.2".parse().unwrap()).await);
        assert_eq!(prober.runner().pinged().len(), 2);
    }
}
