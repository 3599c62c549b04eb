#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use gatelink_core::{ConnectionState, Supervisor, SupervisorConfig};
use tokio::time::Instant;

use common::{StubConnector, eventually, fast_tuning, gate, wait_for_state};

fn supervisor(connector: &StubConnector, tuning: SupervisorConfig) -> Supervisor<StubConnector> {
    Supervisor::new(Arc::new(connector.clone()), tuning)
}

#[tokio::test]
async fn starts_idle() {
    let connector = StubConnector::new();
    let sup = supervisor(&connector, fast_tuning());

    assert_eq!(sup.state(), ConnectionState::Idle);
    assert!(!sup.is_running());
    assert!(sup.device().is_none());
    assert!(sup.active_channel().is_none());
    assert_eq!(connector.attempts(), 0);
}

#[tokio::test]
async fn start_connects_and_exposes_channel() {
    let connector = StubConnector::new();
    let sup = supervisor(&connector, fast_tuning());
    let device = gate("Gate1", "10.0.0.5");

    let mut rx = sup.subscribe();
    sup.start(device.clone()).await;
    wait_for_state(&mut rx, ConnectionState::Connected).await;

    assert_eq!(sup.device(), Some(device));
    assert!(sup.active_channel().is_some());
    assert_eq!(connector.open(), 1);
    assert_eq!(connector.connected_to()[0].to_string(), "10.0.0.5:4567");

    sup.stop().await;
}

#[tokio::test]
async fn receive_waits_for_the_configured_tick() {
    let connector = StubConnector::new();
    let tuning = SupervisorConfig {
        receive_timeout: Duration::from_millis(75),
        ..fast_tuning()
    };
    let sup = supervisor(&connector, tuning);

    let mut rx = sup.subscribe();
    sup.start(gate("Gate1", "10.0.0.5")).await;
    wait_for_state(&mut rx, ConnectionState::Connected).await;

    eventually("first receive", || connector.last_receive_timeout().is_some()).await;
    assert_eq!(connector.last_receive_timeout(), Some(Duration::from_millis(75)));
    sup.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn restarts_never_overlap_channels() {
    let connector = StubConnector::new();
    let sup = Arc::new(supervisor(&connector, fast_tuning()));

    for i in 0..5 {
        sup.start(gate(&format!("Gate{i}"), &format!("10.0.0.{i}"))).await;
    }

    // Concurrent starts are serialized too.
    let (a, b) = (Arc::clone(&sup), Arc::clone(&sup));
    tokio::join!(
        a.start(gate("GateA", "10.0.1.1")),
        b.start(gate("GateB", "10.0.1.2"))
    );

    let mut rx = sup.subscribe();
    wait_for_state(&mut rx, ConnectionState::Connected).await;
    eventually("exactly one open channel", || connector.open() == 1).await;
    assert_eq!(connector.max_open(), 1);

    sup.stop().await;
    assert_eq!(connector.open(), 0);
}

#[tokio::test]
async fn stop_returns_within_bound_and_closes_channel() {
    // Production receive timeout: stop must not wait out a full tick.
    let connector = StubConnector::new();
    let sup = supervisor(&connector, SupervisorConfig::default());

    let mut rx = sup.subscribe();
    sup.start(gate("Gate1", "10.0.0.5")).await;
    wait_for_state(&mut rx, ConnectionState::Connected).await;

    let began = Instant::now();
    sup.stop().await;
    let took = began.elapsed();

    assert!(took < Duration::from_millis(1500), "stop took {took:?}");
    assert_eq!(sup.state(), ConnectionState::Idle);
    assert!(sup.device().is_none());
    assert_eq!(connector.open(), 0);
}

#[tokio::test]
async fn stop_interrupts_retry_wait() {
    let connector = StubConnector::new();
    connector.fail_always(true);
    let sup = supervisor(&connector, SupervisorConfig::default());

    sup.start(gate("Gate1", "10.0.0.5")).await;
    eventually("first connect attempt", || connector.attempts() == 1).await;

    let began = Instant::now();
    sup.stop().await;
    assert!(began.elapsed() < Duration::from_millis(1500));
    assert_eq!(connector.attempts(), 1);
    assert_eq!(sup.state(), ConnectionState::Idle);
}

#[tokio::test]
async fn stop_is_idempotent() {
    let connector = StubConnector::new();
    let sup = supervisor(&connector, fast_tuning());

    sup.stop().await;
    assert_eq!(sup.state(), ConnectionState::Idle);

    sup.start(gate("Gate1", "10.0.0.5")).await;
    sup.stop().await;
    sup.stop().await;

    assert_eq!(sup.state(), ConnectionState::Idle);
    assert_eq!(connector.open(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_connects_are_retried_after_delay() {
    let connector = StubConnector::new();
    connector.fail_next(2);
    let sup = supervisor(&connector, SupervisorConfig::default());

    let began = Instant::now();
    let mut rx = sup.subscribe();
    sup.start(gate("Gate1", "10.0.0.5")).await;
    wait_for_state(&mut rx, ConnectionState::Connected).await;

    let took = began.elapsed();
    assert_eq!(connector.attempts(), 3);
    assert!(took >= Duration::from_secs(20), "connected after {took:?}");
    assert!(took < Duration::from_secs(21), "connected after {took:?}");

    let times = connector.attempt_times();
    assert!(times[1] - times[0] >= Duration::from_secs(10));
    assert!(times[2] - times[1] >= Duration::from_secs(10));

    sup.stop().await;
}

#[tokio::test]
async fn lost_connection_is_reestablished() {
    let connector = StubConnector::new();
    let sup = supervisor(&connector, fast_tuning());

    let mut rx = sup.subscribe();
    sup.start(gate("Gate1", "10.0.0.5")).await;
    wait_for_state(&mut rx, ConnectionState::Connected).await;

    connector.sever();
    eventually("reconnect", || connector.attempts() == 2).await;
    wait_for_state(&mut rx, ConnectionState::Connected).await;

    assert_eq!(connector.open(), 1);
    assert_eq!(connector.max_open(), 1);
    sup.stop().await;
}

#[tokio::test]
async fn restart_binds_new_device() {
    let connector = StubConnector::new();
    let sup = supervisor(&connector, fast_tuning());
    let mut rx = sup.subscribe();

    sup.start(gate("Gate1", "10.0.0.5")).await;
    wait_for_state(&mut rx, ConnectionState::Connected).await;

    let moved = gate("Gate1", "10.0.0.9");
    sup.start(moved.clone()).await;
    assert_eq!(sup.device(), Some(moved));
    eventually("second connect", || connector.connected_to().len() == 2).await;

    assert_eq!(connector.connected_to()[1].host, "10.0.0.9");
    assert_eq!(connector.max_open(), 1);
    sup.stop().await;
}
