//! Long-running supervision: `gatelink run`.
//!
//! Loads the config, starts the monitor and announces a configuration
//! change whenever the device list may have moved on: once at startup,
//! on SIGHUP, and when the file content changes between polls.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use gatelink_core::{DeviceKind, MemoryStore, Monitor, TcpConnector};

use crate::cli::{GlobalOpts, RunArgs};
use crate::config;
use crate::error::CliError;

type GateMonitor = Monitor<TcpConnector, MemoryStore>;

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::active_path(global);
    let cfg = config::load(global)?;
    let tuning = cfg.supervisor.to_supervisor_config()?;

    let store = Arc::new(cfg.device_store());
    let monitor: GateMonitor = Monitor::new(
        TcpConnector,
        Arc::clone(&store),
        DeviceKind::CONTROLLER,
        cfg.routing,
        tuning,
    );

    let every = args
        .reload_interval
        .unwrap_or(cfg.defaults.reload_interval_secs);

    monitor.start().await;
    monitor.notify_config_changed();
    info!(
        path = %path.display(),
        devices = cfg.devices.len(),
        routing = %cfg.routing,
        reload_every = %humantime::format_duration(Duration::from_secs(every)),
        "gatelink running"
    );

    let mut poll = poll_interval(every);
    let mut hangup = Hangup::new()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result?;
                info!("interrupted, shutting down");
                break;
            }
            () = hangup.recv() => {
                info!("SIGHUP received, reloading configuration");
                reload(&path, &store, &monitor, true);
            }
            () = tick(&mut poll) => reload(&path, &store, &monitor, false),
        }
    }

    monitor.shutdown().await;
    Ok(())
}

/// Re-read the file into the store and notify the monitor.
///
/// A broken file keeps the current configuration running.
fn reload(path: &Path, store: &MemoryStore, monitor: &GateMonitor, forced: bool) {
    let cfg = match config::load_config(path).and_then(|c| c.validate().map(|()| c)) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed reloading configuration, keeping current");
            return;
        }
    };

    if cfg.routing != monitor.routing() {
        warn!(
            current = %monitor.routing(),
            configured = %cfg.routing,
            "routing changes take effect after a restart"
        );
    }

    let changed = store.replace(cfg.devices);
    if changed || forced {
        monitor.notify_config_changed();
    } else {
        debug!("configuration unchanged");
    }
}

fn poll_interval(secs: u64) -> Option<Interval> {
    if secs == 0 {
        return None;
    }
    let period = Duration::from_secs(secs);
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    Some(interval)
}

async fn tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ── SIGHUP ───────────────────────────────────────────────────────────

struct Hangup {
    #[cfg(unix)]
    signal: tokio::signal::unix::Signal,
}

impl Hangup {
    #[cfg(unix)]
    fn new() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            signal: signal(SignalKind::hangup())?,
        })
    }

    #[cfg(not(unix))]
    #[allow(clippy::unnecessary_wraps)]
    fn new() -> std::io::Result<Self> {
        Ok(Self {})
    }

    #[cfg(unix)]
    async fn recv(&mut self) {
        if self.signal.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    #[cfg(not(unix))]
    async fn recv(&mut self) {
        std::future::pending::<()>().await;
    }
}
