// ── Monitor ──
//
// Facade wiring the pieces together for a host: the supervisors, the
// configuration listener task, the command dispatcher and the rule
// action bridge. Plays the role the background service plays in the
// host: `start()` on login, `shutdown()` on logout. A monitor may go
// through any number of such cycles.

use std::sync::Arc;

use gatelink_api::Connector;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::actions::RuleActionBridge;
use crate::config::{Routing, SupervisorConfig};
use crate::dispatcher::CommandDispatcher;
use crate::fleet::Fleet;
use crate::listener::{ConfigChanged, ConfigListener};
use crate::model::{DeviceConfig, DeviceKind, DeviceRef};
use crate::store::DeviceStore;
use crate::supervisor::ConnectionState;

const NOTIFY_CHANNEL_SIZE: usize = 16;

/// Snapshot of one supervised connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub device: Option<DeviceConfig>,
    pub state: ConnectionState,
}

/// The main entry point for hosts.
///
/// Cheaply cloneable via `Arc<MonitorInner>`.
pub struct Monitor<C: Connector, S: DeviceStore> {
    inner: Arc<MonitorInner<C, S>>,
}

impl<C: Connector, S: DeviceStore> Clone for Monitor<C, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct MonitorInner<C: Connector, S: DeviceStore> {
    kind: DeviceKind,
    store: Arc<S>,
    fleet: Arc<Fleet<C>>,
    notify_tx: broadcast::Sender<ConfigChanged>,
    listener_task: Mutex<Option<ListenerTask>>,
}

/// One session of the configuration listener.
struct ListenerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl<C: Connector, S: DeviceStore> Monitor<C, S> {
    /// Create a monitor. Does NOT start listening -- call
    /// [`start()`](Self::start).
    pub fn new(
        connector: C,
        store: Arc<S>,
        kind: DeviceKind,
        routing: Routing,
        tuning: SupervisorConfig,
    ) -> Self {
        let (notify_tx, _) = broadcast::channel(NOTIFY_CHANNEL_SIZE);
        Self {
            inner: Arc::new(MonitorInner {
                kind,
                store,
                fleet: Arc::new(Fleet::new(routing, Arc::new(connector), tuning)),
                notify_tx,
                listener_task: Mutex::new(None),
            }),
        }
    }

    pub fn routing(&self) -> Routing {
        self.inner.fleet.routing()
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the configuration listener. Idempotent while running, and
    /// valid again after [`shutdown()`](Self::shutdown).
    ///
    /// No connection is made until the first configuration-changed
    /// notification arrives; hosts typically send one right after.
    pub async fn start(&self) {
        let mut task = self.inner.listener_task.lock().await;
        if task.is_some() {
            return;
        }

        let rx = self.inner.notify_tx.subscribe();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(self.listener().run(rx, cancel.clone()));
        *task = Some(ListenerTask { cancel, handle });
        debug!(kind = %self.inner.kind, "monitor started");
    }

    /// Stop listening and stop every supervisor, waiting for all
    /// workers to exit and release their sockets.
    pub async fn shutdown(&self) {
        // Held throughout so a concurrent start() waits for a clean slate.
        let mut task = self.inner.listener_task.lock().await;
        if let Some(ListenerTask { cancel, handle }) = task.take() {
            cancel.cancel();
            if let Err(e) = handle.await {
                warn!(error = %e, "configuration listener ended abnormally");
            }
        }

        self.inner.fleet.shutdown().await;
        debug!("monitor shut down");
    }

    // ── Notifications ────────────────────────────────────────────

    /// Sender for configuration-changed notifications, for hosts that
    /// publish from elsewhere.
    pub fn notifier(&self) -> broadcast::Sender<ConfigChanged> {
        self.inner.notify_tx.clone()
    }

    /// Announce that configuration of this monitor's kind changed.
    pub fn notify_config_changed(&self) {
        // No receivers just means the listener isn't running yet.
        let _ = self.inner.notify_tx.send(ConfigChanged {
            kind: self.inner.kind,
        });
    }

    // ── Components ───────────────────────────────────────────────

    pub fn dispatcher(&self) -> CommandDispatcher<C> {
        CommandDispatcher::new(Arc::clone(&self.inner.fleet))
    }

    pub fn listener(&self) -> ConfigListener<C, S> {
        ConfigListener::new(
            self.inner.kind,
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.fleet),
        )
    }

    pub fn actions(&self) -> RuleActionBridge<C, S> {
        RuleActionBridge::new(
            self.inner.kind,
            Arc::clone(&self.inner.store),
            self.dispatcher(),
        )
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to the state of the connection serving `target`.
    pub fn watch_state(&self, target: &DeviceRef) -> Option<watch::Receiver<ConnectionState>> {
        self.inner.fleet.route(target).map(|s| s.subscribe())
    }

    /// One entry per supervisor.
    pub fn connections(&self) -> Vec<ConnectionStatus> {
        self.inner
            .fleet
            .all()
            .into_iter()
            .map(|s| ConnectionStatus {
                device: s.device(),
                state: s.state(),
            })
            .collect()
    }
}
