//! Main polling mode command.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use radar_core::{PlayerSnapshot, ProcessHandle, ResolvedOffsets, is_free_for_all, sweep};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CliConfig;
use crate::retry::{attach_with_retry, resolve_with_retry};
use crate::shutdown::ShutdownSignal;

/// One line of output per refresh
#[derive(Debug, Serialize)]
pub struct Tick {
    pub timestamp: String,
    pub free_for_all: bool,
    pub players: Vec<PlayerSnapshot>,
}

impl Tick {
    pub fn new(at: DateTime<Utc>, free_for_all: bool, players: Vec<PlayerSnapshot>) -> Self {
        Self {
            timestamp: at.to_rfc3339(),
            free_for_all,
            players,
        }
    }
}

/// Run the main polling mode until Ctrl+C.
pub fn run(config: &CliConfig) -> Result<()> {
    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        info!("Received shutdown signal, stopping...");
        shutdown_ctrlc.trigger();
    })?;

    info!("radar {}", env!("CARGO_PKG_VERSION"));

    while !shutdown.is_shutdown() {
        let Some(process) =
            attach_with_retry(&config.process_name, config.attach_retry(), &shutdown)?
        else {
            break;
        };

        let offsets = match resolve_with_retry(
            &process,
            &config.plausibility,
            config.attach_retry(),
            &shutdown,
        ) {
            Ok(Some(offsets)) => offsets,
            Ok(None) => break,
            Err(e) => {
                warn!("{}", e);
                process.close();
                continue;
            }
        };

        poll(&process, &offsets, config, &shutdown)?;
        process.close();

        if !shutdown.is_shutdown() {
            info!("Process disconnected, waiting for reconnect...");
        }
    }

    Ok(())
}

/// Sweep and print once per refresh interval until the process exits.
fn poll(
    process: &ProcessHandle,
    offsets: &ResolvedOffsets,
    config: &CliConfig,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let stdout = io::stdout();

    loop {
        if !process.is_alive() {
            info!("Process terminated");
            return Ok(());
        }

        let players = sweep(process, offsets, &config.plausibility);
        let tick = Tick::new(Utc::now(), is_free_for_all(process, offsets), players);
        debug!("Tick with {} player(s)", tick.players.len());

        let mut out = stdout.lock();
        serde_json::to_writer(&mut out, &tick)?;
        writeln!(out)?;
        out.flush()?;
        drop(out);

        if shutdown.wait(config.refresh_interval()) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tick_json_shape() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let tick = Tick::new(at, true, Vec::new());
        let json = serde_json::to_value(&tick).unwrap();

        assert_eq!(json["timestamp"], "2024-05-01T12:30:00+00:00");
        assert_eq!(json["free_for_all"], true);
        assert!(json["players"].as_array().unwrap().is_empty());
    }
}
