//! One-shot command delivery.

use gatelink_core::{Command, DeviceKind, DeviceStore, TcpConnector, send_once};

use crate::cli::{GlobalOpts, SendArgs, SendCommand};
use crate::config;
use crate::error::CliError;

pub async fn handle(args: SendArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let command = match args.command {
        SendCommand::Open => Command::Open,
        SendCommand::Close => Command::Close,
        SendCommand::Raw { text } => Command::Raw(text),
    };
    deliver(global, args.device.as_deref(), &command).await
}

/// Resolve the target from config and send `command` over a fresh connection.
pub async fn deliver(
    global: &GlobalOpts,
    device: Option<&str>,
    command: &Command,
) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let tuning = cfg.supervisor.to_supervisor_config()?;
    let target = cfg.device_store().resolve(DeviceKind::CONTROLLER, device)?;

    send_once(&TcpConnector, &target, command, &tuning).await?;

    if !global.quiet {
        eprintln!("sent {command} to {} ({})", target.name, target.endpoint());
    }
    Ok(())
}
