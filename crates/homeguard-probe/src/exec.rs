//! Bounded external process execution.
//!
//! Ping and firewall inspection both shell out. Every invocation goes through
//! [`run_with_timeout`], so a hung tool is killed instead of stalling a probe.

use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

/// Run `program` with `args`, capturing its output.
///
/// Returns `None` if the program cannot be started or does not exit within
/// `limit`; in the latter case the child is killed.
pub async fn run_with_timeout(program: &str, args: &[String], limit: Duration) -> Option<Output> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match timeout(limit, command.output()).await {
        Ok(Ok(output)) => Some(output),
        Ok(Err(e)) => {
            tracing::debug!(program, error = %e, "Failed to start external tool");
            None
        }
        Err(_) => {
            tracing::debug!(
                program,
                timeout_ms = limit.as_millis() as u64,
                "External tool timed out"
            );
            None
        }
    }
}
