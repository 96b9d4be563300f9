//! Pacing between consecutive probes.
//!
//! The sweep waits on a [`RateLimiter`] before every probe so it never looks
//! like a burst scanner to the target.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

pub trait RateLimiter {
    /// Wait until the next probe may start.
    fn wait_for_next(&mut self) -> impl Future<Output = ()> + Send;
}

/// Enforces a minimum gap between consecutive probes.
///
/// The first call returns immediately; later calls sleep until `delay` has
/// passed since the previous one returned.
#[derive(Debug, Clone)]
pub struct FixedDelayLimiter {
    delay: Duration,
    last: Option<Instant>,
}

impl FixedDelayLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay, last: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl RateLimiter for FixedDelayLimiter {
    async fn wait_for_next(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                sleep(self.delay - elapsed).await;
            }
        }
        self.last = Some(Instant::now());
    }
}
