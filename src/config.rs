use std::{path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Loader tuning shared by every panel. All fields have defaults, so a config file
/// only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Number of batches a collection is cut into.
    pub batch_count: usize,
    /// Pause after each batch, in milliseconds.
    pub yield_delay_ms: u64,
    /// Pause between stages, in milliseconds.
    pub stage_delay_ms: u64,
    /// Infer CSV column types; when false every CSV column is read as text.
    pub dynamic_typing: bool,
    /// HTTP request timeout; none means wait indefinitely.
    pub fetch_timeout_secs: Option<u64>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_count: 10,
            yield_delay_ms: 16,
            stage_delay_ms: 50,
            dynamic_typing: true,
            fetch_timeout_secs: None,
        }
    }
}

impl LoaderConfig {
    /// Defaults without any pauses between batches or stages.
    pub fn immediate() -> Self {
        Self { yield_delay_ms: 0, stage_delay_ms: 0, ..Self::default() }
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let config: LoaderConfig = serde_json::from_slice(bytes)
            .context("Failed to parse loader config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json_slice(&bytes)
            .with_context(|| format!("in {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_count == 0 { bail!("batch_count must be at least 1") }
        Ok(())
    }

    #[inline] pub fn yield_delay(&self) -> Duration { Duration::from_millis(self.yield_delay_ms) }

    #[inline] pub fn stage_delay(&self) -> Duration { Duration::from_millis(self.stage_delay_ms) }

    #[inline] pub fn fetch_timeout(&self) -> Option<Duration> { self.fetch_timeout_secs.map(Duration::from_secs) }
}
