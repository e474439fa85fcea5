pub mod load;
pub mod tables;

use anyhow::Result;
use atxmap::LoaderConfig;

/// Config from --config (or defaults), before per-command overrides.
pub fn base_config(cli: &crate::cli::Cli) -> Result<LoaderConfig> {
    match &cli.config {
        Some(path) => LoaderConfig::from_file(path),
        None => Ok(LoaderConfig::default()),
    }
}
