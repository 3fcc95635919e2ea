//! Optional TOML configuration file

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use radar_core::Plausibility;
use radar_core::config::{process, timing};
use serde::{Deserialize, Serialize};

/// Settings read from `radar.toml`; every field may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub process_name: String,
    pub refresh_interval_ms: u64,
    pub attach_retry_ms: u64,
    pub plausibility: Plausibility,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            process_name: process::NAME.to_string(),
            refresh_interval_ms: timing::REFRESH_INTERVAL.as_millis() as u64,
            attach_retry_ms: timing::ATTACH_RETRY_DELAY.as_millis() as u64,
            plausibility: Plausibility::default(),
        }
    }
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(1))
    }

    pub fn attach_retry(&self) -> Duration {
        Duration::from_millis(self.attach_retry_ms.max(1))
    }
}
