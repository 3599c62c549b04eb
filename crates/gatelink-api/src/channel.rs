//! Raw TCP channel to a single controller.
//!
//! A [`Connector`] opens a [`Channel`] to one host:port. The channel
//! offers a receive bounded by a caller-supplied timeout, a
//! fire-and-forget send, and an idempotent close. Nothing here parses the bytes that flow
//! through: framing is the caller's business.
//!
//! The traits exist so the supervisor can be driven by an in-memory
//! connector in tests; [`TcpConnector`] is the production implementation.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::error::Error;

// ── Design values ────────────────────────────────────────────────────

/// Port the controller listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 4567;

/// Default per-call receive timeout. Doubles as the supervisor's idle tick.
pub const DEFAULT_RECEIVE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Upper bound on a single connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Inbound bytes are read in chunks of at most this size.
pub const READ_CHUNK_SIZE: usize = 256;

// ── Endpoint ─────────────────────────────────────────────────────────

/// Host and port of a controller.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bare IPv6 literals need brackets to stay unambiguous.
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

// ── Traits ───────────────────────────────────────────────────────────

/// A live, bidirectional byte channel to one controller.
///
/// `receive` and `send` may run concurrently from different tasks: the
/// supervisor owns the receive side, the command dispatcher borrows the
/// send side.
pub trait Channel: Send + Sync + 'static {
    /// The endpoint this channel is connected to.
    fn endpoint(&self) -> &Endpoint;

    /// Read up to `buf.len()` bytes.
    ///
    /// Returns [`Error::ReceiveTimeout`] when nothing arrived within
    /// `timeout`, and [`Error::Closed`] on EOF.
    fn receive(
        &self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> impl Future<Output = Result<usize, Error>> + Send;

    /// Write all of `bytes`.
    fn send(&self, bytes: &[u8]) -> impl Future<Output = Result<(), Error>> + Send;

    /// Shut the channel down. Safe to call more than once.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// Opens channels to controllers.
pub trait Connector: Send + Sync + 'static {
    type Channel: Channel;

    fn connect(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Channel, Error>> + Send;
}

// ── TCP implementation ───────────────────────────────────────────────

/// Opens plain TCP channels.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Channel = TcpChannel;

    async fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<TcpChannel, Error> {
        if endpoint.host.trim().is_empty() {
            return Err(Error::InvalidAddress(endpoint.to_string()));
        }

        debug!(addr = %endpoint, "connecting to controller");

        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        let stream = match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                return Err(Error::Connect {
                    addr: endpoint.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(Error::Connect {
                    addr: endpoint.to_string(),
                    reason: format!("timed out after {}ms", timeout.as_millis()),
                });
            }
        };

        // Commands are tiny; don't let Nagle sit on them.
        if let Err(e) = stream.set_nodelay(true) {
            trace!(error = %e, "could not set TCP_NODELAY");
        }

        let (reader, writer) = stream.into_split();
        Ok(TcpChannel {
            endpoint: endpoint.clone(),
            reader: Mutex::new(reader),
            writer: Mutex::new(Some(writer)),
            closed: AtomicBool::new(false),
        })
    }
}

/// A connected TCP stream split into independently locked halves.
pub struct TcpChannel {
    endpoint: Endpoint,
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<Option<OwnedWriteHalf>>,
    closed: AtomicBool,
}

impl fmt::Debug for TcpChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpChannel")
            .field("endpoint", &self.endpoint)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Channel for TcpChannel {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn receive(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, Error> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        if buf.is_empty() {
            return Ok(0);
        }

        let mut reader = self.reader.lock().await;
        match tokio::time::timeout(timeout, reader.read(buf)).await {
            Err(_) => Err(Error::ReceiveTimeout(timeout)),
            Ok(Ok(0)) => Err(Error::Closed),
            Ok(Ok(n)) => Ok(n),
            Ok(Err(e)) => Err(Error::Io(e)),
        }
    }

    async fn send(&self, bytes: &[u8]) -> Result<(), Error> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(Error::Closed)?;
        writer.write_all(bytes).await?;
        trace!(addr = %self.endpoint, bytes = bytes.len(), "sent");
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            if let Err(e) = writer.shutdown().await {
                trace!(error = %e, "shutdown on close failed");
            }
            debug!(addr = %self.endpoint, "channel closed");
        }
    }
}
