//! In-memory connector for driving supervisors without sockets.
#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gatelink_api::Error;
use gatelink_core::{
    Channel, ConnectionState, Connector, DeviceConfig, DeviceId, Endpoint, SupervisorConfig,
};
use tokio::sync::{Notify, watch};
use tokio::time::Instant;

// ── StubConnector ───────────────────────────────────────────────────

/// Scriptable connector. Clones share state, so a test can keep one
/// handle and give another to the code under test.
#[derive(Clone)]
pub struct StubConnector {
    state: Arc<StubState>,
}

#[derive(Default)]
struct StubState {
    failures_left: AtomicUsize,
    fail_always: AtomicBool,
    attempts: AtomicUsize,
    attempt_times: Mutex<Vec<Instant>>,
    open: AtomicUsize,
    max_open: AtomicUsize,
    epoch: AtomicU64,
    severed: Notify,
    connected_to: Mutex<Vec<Endpoint>>,
    sent: Mutex<Vec<(Endpoint, Vec<u8>)>>,
    last_receive_timeout: Mutex<Option<Duration>>,
}

impl StubConnector {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
        }
    }

    /// Fail the next `n` connect attempts.
    pub fn fail_next(&self, n: usize) {
        self.state.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn fail_always(&self, fail: bool) {
        self.state.fail_always.store(fail, Ordering::SeqCst);
    }

    /// Break every channel opened so far, as if the peer hung up.
    pub fn sever(&self) {
        self.state.epoch.fetch_add(1, Ordering::SeqCst);
        self.state.severed.notify_waiters();
    }

    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    pub fn attempt_times(&self) -> Vec<Instant> {
        self.state.attempt_times.lock().unwrap().clone()
    }

    /// Channels currently open (connected and not yet closed).
    pub fn open(&self) -> usize {
        self.state.open.load(Ordering::SeqCst)
    }

    /// Highest number of channels ever open at once.
    pub fn max_open(&self) -> usize {
        self.state.max_open.load(Ordering::SeqCst)
    }

    pub fn connected_to(&self) -> Vec<Endpoint> {
        self.state.connected_to.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(Endpoint, Vec<u8>)> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn sent_bytes(&self) -> Vec<Vec<u8>> {
        self.sent().into_iter().map(|(_, bytes)| bytes).collect()
    }

    /// Timeout passed to the most recent receive on any channel.
    pub fn last_receive_timeout(&self) -> Option<Duration> {
        *self.state.last_receive_timeout.lock().unwrap()
    }
}

impl Connector for StubConnector {
    type Channel = StubChannel;

    async fn connect(&self, endpoint: &Endpoint, _timeout: Duration) -> Result<StubChannel, Error> {
        let state = &self.state;
        state.attempts.fetch_add(1, Ordering::SeqCst);
        state.attempt_times.lock().unwrap().push(Instant::now());

        let scripted_failure = state
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if scripted_failure || state.fail_always.load(Ordering::SeqCst) {
            return Err(Error::Connect {
                addr: endpoint.to_string(),
                reason: "connection refused".into(),
            });
        }

        let open = state.open.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_open.fetch_max(open, Ordering::SeqCst);
        state.connected_to.lock().unwrap().push(endpoint.clone());

        Ok(StubChannel {
            endpoint: endpoint.clone(),
            epoch: state.epoch.load(Ordering::SeqCst),
            closed: AtomicBool::new(false),
            state: Arc::clone(state),
        })
    }
}

pub struct StubChannel {
    endpoint: Endpoint,
    epoch: u64,
    closed: AtomicBool,
    state: Arc<StubState>,
}

impl StubChannel {
    fn severed(&self) -> bool {
        self.state.epoch.load(Ordering::SeqCst) != self.epoch
    }
}

impl Channel for StubChannel {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn receive(&self, _buf: &mut [u8], timeout: Duration) -> Result<usize, Error> {
        *self.state.last_receive_timeout.lock().unwrap() = Some(timeout);
        let notified = self.state.severed.notified();
        if self.closed.load(Ordering::SeqCst) || self.severed() {
            return Err(Error::Closed);
        }

        tokio::select! {
            () = notified => Err(Error::Closed),
            () = tokio::time::sleep(timeout) => {
                if self.severed() {
                    Err(Error::Closed)
                } else {
                    Err(Error::ReceiveTimeout(timeout))
                }
            }
        }
    }

    async fn send(&self, bytes: &[u8]) -> Result<(), Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::Closed);
        }
        self.state
            .sent
            .lock()
            .unwrap()
            .push((self.endpoint.clone(), bytes.to_vec()));
        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.open.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Short delays so tests run in milliseconds of real time.
pub fn fast_tuning() -> SupervisorConfig {
    SupervisorConfig {
        receive_timeout: Duration::from_millis(50),
        retry_delay: Duration::from_millis(100),
        ..SupervisorConfig::default()
    }
}

pub fn gate(name: &str, ip: &str) -> DeviceConfig {
    DeviceConfig::new(DeviceId::generate(), name, ip)
}

/// Wait until the watched state equals `state`.
pub async fn wait_for_state(rx: &mut watch::Receiver<ConnectionState>, state: ConnectionState) {
    tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|s| *s == state))
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {state}"))
        .expect("state channel closed");
}

/// Poll `check` until it holds.
pub async fn eventually(what: &str, check: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
