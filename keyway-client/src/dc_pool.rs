//! Per-DC connection pool.
//!
//! Keeps one shared [`Connection`] per DC id, created on first use, and
//! merges every connection's inbound frames into one pool-wide queue.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::connection::{Connection, Inbound};
use crate::{Config, TransportError};

/// Opens the byte stream for a DC.
pub trait Connect: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Send + 'static;

    fn connect(&self, dc: i32) -> impl Future<Output = Result<Self::Stream, TransportError>> + Send;
}

/// Plain TCP to the configured DC table.
#[derive(Clone, Debug)]
pub struct TcpConnector {
    config: Config,
}

impl TcpConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Connect for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, dc: i32) -> Result<TcpStream, TransportError> {
        let addr = self.config.dc_addr(dc)?;
        tracing::info!("[pool] Connecting to DC{dc} at {addr} …");
        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::Timeout)??;
        stream.set_nodelay(true)?;
        Ok(stream)
    }
}

/// Shared connections keyed by DC id plus the merged inbound queue.
pub struct ConnectionPool<C: Connect = TcpConnector> {
    connector: C,
    default_dc: i32,
    read_buffer: usize,
    connections: Mutex<HashMap<i32, Arc<Connection>>>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<Inbound>>,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl ConnectionPool<TcpConnector> {
    /// A pool dialing the DC table of `config` over TCP.
    pub fn tcp(config: &Config) -> Self {
        Self::new(TcpConnector::new(config.clone()), config)
    }
}

impl<C: Connect> ConnectionPool<C> {
    pub fn new(connector: C, config: &Config) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            connector,
            default_dc: config.dc,
            read_buffer: config.read_buffer,
            connections: Mutex::new(HashMap::new()),
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            cancel: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn default_dc(&self) -> i32 {
        self.default_dc
    }

    /// Send `bytes` on the connection for `dc` (the default DC when `None`),
    /// connecting first if this DC has no connection yet.
    pub async fn queue(&self, msg_id: i64, bytes: Vec<u8>, dc: Option<i32>) -> Result<(), TransportError> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Closed);
        }
        let dc = dc.unwrap_or(self.default_dc);
        tracing::debug!("[pool] queue msg_id={msg_id:#x} ({} bytes) on DC{dc}", bytes.len());

        let conn = self.connection(dc).await?;
        conn.send(bytes)
    }

    async fn connection(&self, dc: i32) -> Result<Arc<Connection>, TransportError> {
        let mut connections = self.connections.lock().await;
        if let Some(conn) = connections.get(&dc) {
            return Ok(Arc::clone(conn));
        }

        let stream = self.connector.connect(dc).await?;
        let (conn, mut frames) =
            Connection::start(dc, stream, self.read_buffer, &self.tasks, self.cancel.child_token());
        let conn = Arc::new(conn);
        connections.insert(dc, Arc::clone(&conn));

        let inbound = self.inbound_tx.clone();
        self.tasks.spawn(async move {
            tracing::debug!("[pool] forwarding frames from DC{dc}");
            while let Some(frame) = frames.recv().await {
                if inbound.send(frame).is_err() {
                    break;
                }
            }
            tracing::debug!("[pool] DC{dc} forwarder stopped");
        });

        tracing::info!("[pool] DC{dc} connected");
        Ok(conn)
    }

    /// All inbound frames, in arrival order, from every connection.
    ///
    /// Holds the inbound queue until the returned reader is dropped.
    pub async fn read(&self) -> Frames<'_> {
        Frames { rx: self.inbound_rx.lock().await, cancel: &self.cancel }
    }

    /// Wait for the next inbound frame.
    pub async fn read_single(&self) -> Result<Vec<u8>, TransportError> {
        self.read().await.next().await.unwrap_or(Err(TransportError::Closed))
    }

    /// [`read_single`](Self::read_single), giving up after `limit`.
    pub async fn read_single_timeout(&self, limit: Duration) -> Result<Vec<u8>, TransportError> {
        tokio::time::timeout(limit, self.read_single()).await.map_err(|_| TransportError::Timeout)?
    }

    /// Discard every frame already waiting in the inbound queue.
    ///
    /// Returns how many were dropped.
    pub async fn drain(&self) -> usize {
        let mut rx = self.inbound_rx.lock().await;
        let mut dropped = 0;
        while rx.try_recv().is_ok() {
            dropped += 1;
        }
        if dropped > 0 {
            tracing::debug!("[pool] discarded {dropped} stale frame(s)");
        }
        dropped
    }

    /// Close every connection and wait for all loops to stop.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tasks.close();
        self.tasks.wait().await;
        self.connections.lock().await.clear();
        tracing::debug!("[pool] shut down");
    }
}

impl<C: Connect> Drop for ConnectionPool<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Reader over the pool's inbound queue.
pub struct Frames<'a> {
    rx: MutexGuard<'a, mpsc::UnboundedReceiver<Inbound>>,
    cancel: &'a CancellationToken,
}

impl Frames<'_> {
    /// The next frame, or `None` once the pool has shut down.
    pub async fn next(&mut self) -> Option<Inbound> {
        tokio::select! {
            biased;
            item = self.rx.recv() => item,
            _ = self.cancel.cancelled() => None,
        }
    }
}
