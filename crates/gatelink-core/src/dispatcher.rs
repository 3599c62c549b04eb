// ── Command dispatcher ──
//
// Hands outbound commands to whichever channel is live right now.
// The channel handle is cloned out under the supervisor's link lock and
// the send happens after the lock is released, so a slow controller
// never blocks state transitions.

use std::sync::Arc;

use gatelink_api::{Channel, Connector};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::config::SupervisorConfig;
use crate::error::CoreError;
use crate::fleet::Fleet;
use crate::model::{DeviceConfig, DeviceRef};

/// What became of a dispatched command.
///
/// Informational only: dispatch never fails outward, and the rule
/// engine is told "success" whatever this says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Written to the controller's socket.
    Sent,
    /// No live connection; the command was dropped without any I/O.
    NoConnection,
    /// The write failed. The supervisor will notice and reconnect.
    Failed,
}

/// Forwards commands to the active controller connection.
///
/// Cheaply cloneable; all clones share the same supervisors.
pub struct CommandDispatcher<C: Connector> {
    fleet: Arc<Fleet<C>>,
}

impl<C: Connector> Clone for CommandDispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            fleet: Arc::clone(&self.fleet),
        }
    }
}

impl<C: Connector> CommandDispatcher<C> {
    pub(crate) fn new(fleet: Arc<Fleet<C>>) -> Self {
        Self { fleet }
    }

    /// Send `command` to the controller serving `target`, best effort.
    ///
    /// With [`Routing::FirstEnabled`](crate::Routing::FirstEnabled) the
    /// target is not used to pick a channel: there is only one.
    pub async fn send_command(&self, target: &DeviceRef, command: &Command) -> Delivery {
        let channel = self
            .fleet
            .route(target)
            .and_then(|supervisor| supervisor.active_channel());

        let Some(channel) = channel else {
            debug!(device = %target, command = %command, "no active controller connection, command dropped");
            return Delivery::NoConnection;
        };

        match channel.send(command.as_bytes()).await {
            Ok(()) => {
                info!(
                    device = %target,
                    addr = %channel.endpoint(),
                    command = %command,
                    "command sent to controller"
                );
                Delivery::Sent
            }
            Err(e) => {
                warn!(
                    device = %target,
                    addr = %channel.endpoint(),
                    command = %command,
                    error = %e,
                    "failed sending command to controller"
                );
                Delivery::Failed
            }
        }
    }
}

/// Connect to `device`, write `command` once and close.
///
/// For callers without a running supervisor. Unlike
/// [`CommandDispatcher::send_command`] this reports failures.
pub async fn send_once<C: Connector>(
    connector: &C,
    device: &DeviceConfig,
    command: &Command,
    tuning: &SupervisorConfig,
) -> Result<(), CoreError> {
    if !device.is_active() {
        return Err(CoreError::DeviceInactive {
            name: device.name.clone(),
        });
    }

    let endpoint = device.endpoint();
    let channel = connector.connect(&endpoint, tuning.connect_timeout).await?;
    let sent = channel.send(command.as_bytes()).await;
    channel.close().await;
    sent?;

    info!(device = %device.name, addr = %endpoint, command = %command, "command sent to controller");
    Ok(())
}
