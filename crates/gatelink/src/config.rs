//! CLI configuration -- thin wrapper around `gatelink_config`.
//!
//! Resolves the file path from `--config` / `GATELINK_CONFIG` before
//! falling back to the platform location.

use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use gatelink_config::{Config, config_path, load_config, save_config};

/// The config file this invocation reads and writes.
pub fn active_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load and validate the active config file.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let cfg = load_config(&active_path(global))?;
    cfg.validate()?;
    Ok(cfg)
}
