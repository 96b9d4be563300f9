//! Alert notification fan-out.
//!
//! The chat integration that actually reaches people lives outside this
//! crate; it plugs in as a [`Notifier`]. The default [`TracingNotifier`]
//! delivers by emitting one structured log event per recipient.

use std::future::Future;

use crate::error::Result;

pub trait Notifier {
    fn notify(&self, recipient: &str, message: &str) -> impl Future<Output = Result<()>> + Send;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    async fn notify(&self, recipient: &str, message: &str) -> Result<()> {
        tracing::warn!(recipient, message, "Security alert");
        Ok(())
    }
}

/// Send `message` to every recipient, one after another.
///
/// A failed delivery is logged and skipped. Returns how many succeeded.
pub async fn broadcast<N: Notifier + Sync>(
    notifier: &N,
    recipients: &[String],
    message: &str,
) -> usize {
    let mut delivered = 0;
    for recipient in recipients {
        match notifier.notify(recipient, message).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(recipient = %recipient, error = %e, "Alert delivery failed"),
        }
    }
    delivered
}
