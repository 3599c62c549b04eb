//! Config subcommand handlers.

use gatelink_core::{DeviceConfig, DeviceId};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

/// Starter file: one disabled example controller to edit.
fn starter() -> Config {
    Config {
        devices: vec![
            DeviceConfig::new(DeviceId::generate(), "Main gate", "192.168.1.50").with_enabled(false),
        ],
        ..Config::default()
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::active_path(global);

    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config(&path)?;
            output::print_output(&output::render_document(&global.output, &cfg)?, global.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config(&starter(), &path)?;
            if !global.quiet {
                eprintln!("Wrote {}", path.display());
                eprintln!("Edit the [[devices]] entry and set enabled = true to use it.");
            }
            Ok(())
        }
    }
}
