#![allow(clippy::unwrap_used)]

mod common;

use gatelink_core::{Command, CoreError, SupervisorConfig, send_once};

use common::{StubConnector, gate};

#[tokio::test]
async fn send_once_writes_and_closes() {
    let connector = StubConnector::new();
    let device = gate("Gate1", "10.0.0.5");

    send_once(&connector, &device, &Command::Open, &SupervisorConfig::default())
        .await
        .unwrap();

    assert_eq!(connector.sent_bytes(), vec![b"OPEN".to_vec()]);
    assert_eq!(connector.open(), 0);
}

#[tokio::test]
async fn send_once_reports_connect_failure() {
    let connector = StubConnector::new();
    connector.fail_always(true);

    let err = send_once(
        &connector,
        &gate("Gate1", "10.0.0.5"),
        &Command::Close,
        &SupervisorConfig::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CoreError::ConnectionFailed { ref addr, .. } if addr == "10.0.0.5:4567"));
    assert!(connector.sent().is_empty());
}

#[tokio::test]
async fn send_once_refuses_disabled_device() {
    let connector = StubConnector::new();
    let device = gate("Gate1", "10.0.0.5").with_enabled(false);

    let err = send_once(&connector, &device, &Command::Open, &SupervisorConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::DeviceInactive { .. }));
    assert_eq!(connector.attempts(), 0);
}
