// ── Configuration change listener ──
//
// Reacts to "configuration changed" notifications for the controller
// kind by re-reading the device list and starting, restarting, or
// stopping supervisors.

use std::collections::HashSet;
use std::sync::Arc;

use gatelink_api::Connector;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fleet::Fleet;
use crate::model::{DeviceConfig, DeviceId, DeviceKind};
use crate::store::DeviceStore;

/// Notification from the host that configuration of `kind` was saved.
///
/// Carries no payload: listeners re-read the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigChanged {
    pub kind: DeviceKind,
}

/// What a reconfiguration pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Devices whose supervisor was (re)started.
    pub started: Vec<DeviceId>,
    /// Devices whose supervisor was stopped.
    pub stopped: Vec<DeviceId>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.started.is_empty() && self.stopped.is_empty()
    }
}

/// Applies the store's device list to the supervisors.
pub struct ConfigListener<C: Connector, S: DeviceStore> {
    kind: DeviceKind,
    store: Arc<S>,
    fleet: Arc<Fleet<C>>,
}

impl<C: Connector, S: DeviceStore> Clone for ConfigListener<C, S> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            store: Arc::clone(&self.store),
            fleet: Arc::clone(&self.fleet),
        }
    }
}

impl<C: Connector, S: DeviceStore> ConfigListener<C, S> {
    pub(crate) fn new(kind: DeviceKind, store: Arc<S>, fleet: Arc<Fleet<C>>) -> Self {
        Self { kind, store, fleet }
    }

    /// Handle one configuration-changed notification.
    pub async fn on_configuration_changed(&self) -> Reconciliation {
        let devices = self.store.list_devices(self.kind);

        let outcome = match &*self.fleet {
            Fleet::Single(_) => self.apply_first(&devices).await,
            Fleet::PerDevice { .. } => self.apply_all(&devices).await,
        };

        info!(
            kind = %self.kind,
            devices = devices.len(),
            started = outcome.started.len(),
            stopped = outcome.stopped.len(),
            "controller configuration changed"
        );
        outcome
    }

    /// First entry wins. An inactive first entry leaves the current
    /// run alone rather than stopping it.
    async fn apply_first(&self, devices: &[DeviceConfig]) -> Reconciliation {
        let mut outcome = Reconciliation::default();

        let Some(first) = devices.first() else {
            debug!("no controllers configured");
            return outcome;
        };

        if first.is_active() {
            self.fleet.get_or_insert(first.id).start(first.clone()).await;
            outcome.started.push(first.id);
        } else {
            debug!(
                device = %first.name,
                enabled = first.enabled,
                "first controller inactive, leaving current connection as is"
            );
        }
        outcome
    }

    /// Diff the full list against the running supervisors.
    async fn apply_all(&self, devices: &[DeviceConfig]) -> Reconciliation {
        let mut outcome = Reconciliation::default();

        let mut seen = HashSet::new();
        let desired: Vec<&DeviceConfig> = devices
            .iter()
            .filter(|d| d.is_active())
            .filter(|d| {
                let fresh = seen.insert(d.id);
                if !fresh {
                    warn!(device = %d.name, id = %d.id, "duplicate controller id, ignoring");
                }
                fresh
            })
            .collect();

        // Removed, disabled, or blanked: stop.
        for id in self.fleet.ids() {
            if desired.iter().any(|d| d.id == id) {
                continue;
            }
            if let Some(supervisor) = self.fleet.remove(id) {
                supervisor.stop().await;
                outcome.stopped.push(id);
            }
        }

        // New or modified: (re)start. Unchanged running ones are left alone.
        for device in desired {
            let supervisor = self.fleet.get_or_insert(device.id);
            let unchanged = supervisor.is_running() && supervisor.device().as_ref() == Some(device);
            if !unchanged {
                supervisor.start(device.clone()).await;
                outcome.started.push(device.id);
            }
        }

        outcome
    }

    /// Consume notifications until cancelled or the bus closes.
    ///
    /// Notifications for other kinds are ignored. A burst of queued
    /// notifications, or a lagged receiver, results in one pass: the
    /// store is the source of truth and is re-read each time.
    pub async fn run(self, mut rx: broadcast::Receiver<ConfigChanged>, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                message = rx.recv() => match message {
                    Ok(ConfigChanged { kind }) if kind == self.kind => {
                        drain(&mut rx);
                        self.on_configuration_changed().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        debug!(missed, "configuration notifications lagged");
                        drain(&mut rx);
                        self.on_configuration_changed().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        debug!("configuration listener exiting");
    }
}

/// Discard everything already queued on `rx`.
fn drain(rx: &mut broadcast::Receiver<ConfigChanged>) {
    use broadcast::error::TryRecvError;

    let mut skipped = 0usize;
    loop {
        match rx.try_recv() {
            Ok(_) => skipped += 1,
            Err(TryRecvError::Lagged(missed)) => {
                skipped = skipped.saturating_add(usize::try_from(missed).unwrap_or(usize::MAX));
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    if skipped > 0 {
        debug!(skipped, "coalesced configuration notifications");
    }
}
