//! Offsets command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use radar_core::{OffsetDump, OffsetResolver, ProcessHandle};

use crate::config::CliConfig;

/// Attach once, resolve every offset and print (or save) the dump.
pub fn run(config: &CliConfig, output: Option<&Path>) -> Result<()> {
    let process = ProcessHandle::find_by_name(&config.process_name)
        .with_context(|| format!("{} is not running", config.process_name))?;
    eprintln!("Found {} (pid {})", config.process_name, process.pid);

    let offsets = OffsetResolver::new(&process)
        .with_plausibility(config.plausibility.clone())
        .resolve()
        .context("Offset resolution failed")?;
    let dump = OffsetDump::from_offsets(&offsets, &process);

    match output {
        Some(path) => {
            dump.save(path)?;
            eprintln!("Offsets saved to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&dump)?),
    }

    process.close();
    Ok(())
}
