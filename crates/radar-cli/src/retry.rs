//! Retry loops for attaching to the game and resolving offsets.

use std::time::Duration;

use anyhow::{Result, bail};
use radar_core::{OffsetResolver, Plausibility, ProcessHandle, ResolvedOffsets};
use tracing::{debug, info};

use crate::shutdown::ShutdownSignal;

/// Wait until a process named `process_name` can be opened.
///
/// Returns `Ok(None)` if shutdown was signaled.
pub fn attach_with_retry(
    process_name: &str,
    delay: Duration,
    shutdown: &ShutdownSignal,
) -> Result<Option<ProcessHandle>> {
    let mut announced = false;
    loop {
        if shutdown.is_shutdown() {
            return Ok(None);
        }

        match ProcessHandle::find_by_name(process_name) {
            Ok(process) => {
                info!(
                    "Attached to {} (pid {}, {})",
                    process_name,
                    process.pid,
                    if process.is_writable() { "read/write" } else { "read-only" }
                );
                return Ok(Some(process));
            }
            Err(e) => {
                if !announced {
                    info!("Waiting for {}...", process_name);
                    announced = true;
                }
                debug!("Attach failed: {}", e);
            }
        }

        if shutdown.wait(delay) {
            return Ok(None);
        }
    }
}

/// Resolve offsets, retrying while the game is still loading its libraries.
///
/// Returns `Ok(None)` if shutdown was signaled and fails once the process is
/// gone, so the caller can go back to waiting for a new instance.
pub fn resolve_with_retry(
    process: &ProcessHandle,
    plausibility: &Plausibility,
    delay: Duration,
    shutdown: &ShutdownSignal,
) -> Result<Option<ResolvedOffsets>> {
    let resolver = OffsetResolver::new(process).with_plausibility(plausibility.clone());
    let mut attempts = 0u32;

    loop {
        if shutdown.is_shutdown() {
            return Ok(None);
        }
        attempts += 1;

        match resolver.resolve() {
            Ok(offsets) => {
                info!("Offsets resolved after {} attempt(s)", attempts);
                return Ok(Some(offsets));
            }
            Err(e) if e.is_process_gone() || !process.is_alive() => {
                bail!("Process exited during offset resolution: {}", e);
            }
            Err(e) => {
                info!(
                    "Offset resolution failed ({}), retrying in {}s (attempt {})",
                    e,
                    delay.as_secs_f32(),
                    attempts
                );
            }
        }

        if shutdown.wait(delay) {
            return Ok(None);
        }
    }
}
