//! Configuration loading for the CLI

use crate::cli::ConfigArgs;
use anchorline_core::config::{CadencePatch, StancePatch};
use anchorline_core::{AnchorConfig, AnchorConfigPatch};
use anyhow::Context;
use std::path::Path;
use tracing::{debug, info};

/// Read a partial YAML configuration
pub fn read_patch(path: &Path) -> anyhow::Result<AnchorConfigPatch> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    // An empty file is an empty patch
    if content.trim().is_empty() {
        return Ok(AnchorConfigPatch::default());
    }

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Defaults, then the config file, then CLI flags
pub fn load(args: &ConfigArgs) -> anyhow::Result<AnchorConfig> {
    let mut config = AnchorConfig::default();

    if let Some(path) = &args.config {
        config.merge(read_patch(path)?);
        info!(path = %path.display(), "Configuration file loaded");
    }

    config.merge(cli_overrides(args));
    debug!(?config, "Effective configuration");

    Ok(config)
}

fn cli_overrides(args: &ConfigArgs) -> AnchorConfigPatch {
    AnchorConfigPatch {
        cadence: args.interval.map(|interval| CadencePatch {
            interval: Some(interval),
            show_tally: None,
        }),
        stance: args.threshold.map(|threshold| StancePatch {
            threshold: Some(threshold),
            ..Default::default()
        }),
        ..Default::default()
    }
}
