// ── Connection supervisor ──
//
// Owns the reconnect loop around one controller channel. A run is a
// single tokio task bound to one `DeviceConfig`; `start()` joins the
// previous run before spawning the next, so at most one channel per
// supervisor is ever live.
//
// State and the active channel sit together behind one short-lived
// mutex (`Link`). The worker swaps them on every transition; the
// command dispatcher clones the channel handle out under the same lock.
// The lock is never held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use strum::Display;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use gatelink_api::{Channel, Connector, Endpoint};

use crate::config::SupervisorConfig;
use crate::model::DeviceConfig;

// ── ConnectionState ──────────────────────────────────────────────

/// Lifecycle of a supervised connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConnectionState {
    /// No run is active.
    Idle,
    /// A run is active and trying to (re)establish the channel.
    Connecting,
    /// The channel is up; commands are forwarded to it.
    Connected,
    /// A stop was requested and the worker is being joined.
    Stopping,
}

// ── Shared link ──────────────────────────────────────────────────

struct Link<Ch> {
    state: ConnectionState,
    channel: Option<Arc<Ch>>,
    device: Option<DeviceConfig>,
}

/// The one piece of state the worker and its observers share.
struct Shared<Ch> {
    link: Mutex<Link<Ch>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl<Ch> Shared<Ch> {
    fn new() -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Idle);
        Self {
            link: Mutex::new(Link {
                state: ConnectionState::Idle,
                channel: None,
                device: None,
            }),
            state_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Link<Ch>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Worker-side transition: swap the channel and move to `state`,
    /// unless a stop is already underway. Returns the previous channel.
    fn publish(&self, state: ConnectionState, channel: Option<Arc<Ch>>) -> Option<Arc<Ch>> {
        let mut link = self.lock();
        let previous = std::mem::replace(&mut link.channel, channel);
        if link.state != ConnectionState::Stopping {
            link.state = state;
            self.state_tx.send_replace(state);
        }
        previous
    }

    /// Supervisor-side transition: always applies.
    fn force(&self, state: ConnectionState) {
        let mut link = self.lock();
        link.state = state;
        self.state_tx.send_replace(state);
    }

    /// Reset to `Idle`, handing back anything the worker left behind.
    fn reset(&self) -> Option<Arc<Ch>> {
        let mut link = self.lock();
        link.state = ConnectionState::Idle;
        link.device = None;
        self.state_tx.send_replace(ConnectionState::Idle);
        link.channel.take()
    }

    fn bind(&self, device: DeviceConfig) {
        let mut link = self.lock();
        link.device = Some(device);
        link.state = ConnectionState::Connecting;
        self.state_tx.send_replace(ConnectionState::Connecting);
    }

    fn state(&self) -> ConnectionState {
        self.lock().state
    }

    fn device(&self) -> Option<DeviceConfig> {
        self.lock().device.clone()
    }

    /// The active channel, only while connected.
    fn channel(&self) -> Option<Arc<Ch>> {
        let link = self.lock();
        match link.state {
            ConnectionState::Connected => link.channel.clone(),
            _ => None,
        }
    }
}

// ── Supervisor ───────────────────────────────────────────────────

struct Run {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Keeps one controller connected for as long as it is started.
///
/// Connect failures are logged and retried after
/// [`retry_delay`](SupervisorConfig::retry_delay); a lost connection is
/// re-established immediately. Nothing here fails outward.
pub struct Supervisor<C: Connector> {
    connector: Arc<C>,
    tuning: SupervisorConfig,
    shared: Arc<Shared<C::Channel>>,
    /// Serializes start/stop so two runs never overlap.
    run: tokio::sync::Mutex<Option<Run>>,
}

impl<C: Connector> Supervisor<C> {
    pub fn new(connector: Arc<C>, tuning: SupervisorConfig) -> Self {
        Self {
            connector,
            tuning,
            shared: Arc::new(Shared::new()),
            run: tokio::sync::Mutex::new(None),
        }
    }

    /// Start supervising `device`, stopping any previous run first.
    ///
    /// Returns once the new worker is spawned; the first connect attempt
    /// happens in the background.
    pub async fn start(&self, device: DeviceConfig) {
        let mut run = self.run.lock().await;
        if let Some(previous) = run.take() {
            self.finish(previous).await;
        }

        let endpoint = device.endpoint();
        info!(device = %device.name, addr = %endpoint, "starting controller supervisor");

        self.shared.bind(device.clone());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(supervise(
            Arc::clone(&self.connector),
            self.tuning.clone(),
            Arc::clone(&self.shared),
            device,
            cancel.clone(),
        ));

        *run = Some(Run { cancel, handle });
    }

    /// Stop the current run and wait for its worker to exit.
    ///
    /// A no-op when already idle.
    pub async fn stop(&self) {
        let mut run = self.run.lock().await;
        match run.take() {
            Some(previous) => self.finish(previous).await,
            None => debug!("supervisor already idle"),
        }
    }

    async fn finish(&self, run: Run) {
        self.shared.force(ConnectionState::Stopping);
        run.cancel.cancel();

        if let Err(e) = run.handle.await {
            warn!(error = %e, "supervisor worker ended abnormally");
        }

        // The worker closes its own channel on exit; this only catches
        // a worker that panicked mid-connection.
        if let Some(channel) = self.shared.reset() {
            channel.close().await;
        }
        debug!("supervisor stopped");
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state_tx.subscribe()
    }

    /// The device the current run is bound to, if any.
    pub fn device(&self) -> Option<DeviceConfig> {
        self.shared.device()
    }

    /// Whether a run is active (any state but `Idle`).
    pub fn is_running(&self) -> bool {
        self.state() != ConnectionState::Idle
    }

    /// The live channel, only while connected.
    pub fn active_channel(&self) -> Option<Arc<C::Channel>> {
        self.shared.channel()
    }
}

impl<C: Connector> Drop for Supervisor<C> {
    fn drop(&mut self) {
        // Dropping without stop() can't join, but must not leak the task.
        if let Some(run) = self.run.get_mut().take() {
            run.cancel.cancel();
        }
    }
}

// ── Worker ───────────────────────────────────────────────────────

/// Outer loop: connect, receive until the channel fails, reconnect.
async fn supervise<C: Connector>(
    connector: Arc<C>,
    tuning: SupervisorConfig,
    shared: Arc<Shared<C::Channel>>,
    device: DeviceConfig,
    cancel: CancellationToken,
) {
    let endpoint = device.endpoint();
    let mut attempt: u32 = 0;

    while !cancel.is_cancelled() {
        let connected = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connector.connect(&endpoint, tuning.connect_timeout) => result,
        };

        let channel = match connected {
            Ok(channel) => Arc::new(channel),
            Err(e) => {
                attempt = attempt.saturating_add(1);
                warn!(
                    device = %device.name,
                    addr = %endpoint,
                    error = %e,
                    attempt,
                    retry_in = %humantime::format_duration(tuning.retry_delay),
                    "failed connecting to controller"
                );

                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(tuning.retry_delay) => {}
                }
                continue;
            }
        };

        attempt = 0;
        shared.publish(ConnectionState::Connected, Some(Arc::clone(&channel)));
        info!(device = %device.name, addr = %endpoint, "connected to controller");

        let outcome = receive_loop(channel.as_ref(), &tuning, &device, &cancel).await;

        // Unpublish before closing so no command races onto a dead socket.
        shared.publish(ConnectionState::Connecting, None);
        channel.close().await;

        if let Err(e) = outcome {
            warn!(
                device = %device.name,
                addr = %endpoint,
                error = %e,
                "connection to controller lost, reconnecting"
            );
        }
    }

    debug!(device = %device.name, "supervisor worker exiting");
}

/// Inner loop: log whatever the controller sends.
///
/// Each receive waits at most `tuning.receive_timeout`. Returns `Ok(())`
/// when cancelled and the transport error otherwise. Receive timeouts are
/// the idle tick and never leave the loop.
async fn receive_loop<Ch: Channel>(
    channel: &Ch,
    tuning: &SupervisorConfig,
    device: &DeviceConfig,
    cancel: &CancellationToken,
) -> Result<(), gatelink_api::Error> {
    let mut buf = vec![0u8; tuning.read_chunk.max(1)];

    loop {
        let received = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            result = channel.receive(&mut buf, tuning.receive_timeout) => result,
        };

        match received {
            Ok(n) if n > 0 => log_payload(device, channel.endpoint(), buf.get(..n).unwrap_or_default()),
            Ok(_) => {}
            Err(e) if e.is_timeout() => {}
            Err(e) => return Err(e),
        }
    }
}

fn log_payload(device: &DeviceConfig, endpoint: &Endpoint, payload: &[u8]) {
    info!(
        device = %device.name,
        addr = %endpoint,
        bytes = payload.len(),
        data = %String::from_utf8_lossy(payload),
        "received data from controller"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoChannel;

    #[test]
    fn shared_starts_idle() {
        let shared: Shared<NoChannel> = Shared::new();
        assert_eq!(shared.state(), ConnectionState::Idle);
        assert!(shared.channel().is_none());
        assert!(shared.device().is_none());
    }

    #[test]
    fn channel_hidden_unless_connected() {
        let shared: Shared<NoChannel> = Shared::new();
        shared.publish(ConnectionState::Connecting, Some(Arc::new(NoChannel)));
        assert!(shared.channel().is_none());

        shared.publish(ConnectionState::Connected, Some(Arc::new(NoChannel)));
        assert!(shared.channel().is_some());
    }

    #[test]
    fn publish_does_not_override_stopping() {
        let shared: Shared<NoChannel> = Shared::new();
        shared.force(ConnectionState::Stopping);
        let previous = shared.publish(ConnectionState::Connected, Some(Arc::new(NoChannel)));

        assert!(previous.is_none());
        assert_eq!(shared.state(), ConnectionState::Stopping);
        assert!(shared.channel().is_none());
    }

    #[test]
    fn reset_returns_leftover_channel() {
        let shared: Shared<NoChannel> = Shared::new();
        shared.publish(ConnectionState::Connected, Some(Arc::new(NoChannel)));

        assert!(shared.reset().is_some());
        assert_eq!(shared.state(), ConnectionState::Idle);
        assert!(shared.reset().is_none());
    }

    #[test]
    fn state_changes_reach_subscribers() {
        let shared: Shared<NoChannel> = Shared::new();
        let rx = shared.state_tx.subscribe();
        shared.force(ConnectionState::Connecting);
        assert_eq!(*rx.borrow(), ConnectionState::Connecting);
    }
}
