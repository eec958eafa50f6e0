//! One abridged-framed byte stream driven by a send task and a receive task.

use keyway_mtproto::transport::{self, FrameDecoder};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::TransportError;

/// An inbound frame, or the error that ended the connection.
pub type Inbound = Result<Vec<u8>, TransportError>;

enum Outbound {
    /// The one-byte abridged marker, written without a length prefix.
    Marker,
    Frame { header: Vec<u8>, payload: Vec<u8> },
}

/// Write side of a running connection. Frames arrive on the receiver
/// returned by [`Connection::start`].
#[derive(Debug)]
pub struct Connection {
    dc: i32,
    outbound: mpsc::UnboundedSender<Outbound>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Outbound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Marker => write!(f, "Marker"),
            Self::Frame { payload, .. } => write!(f, "Frame({} bytes)", payload.len()),
        }
    }
}

impl Connection {
    /// Queue the abridged marker and spawn both loops on `tasks`.
    ///
    /// Cancelling `cancel` (or any socket error) stops both loops.
    pub fn start<S>(
        dc: i32,
        stream: S,
        read_buffer: usize,
        tasks: &TaskTracker,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<Inbound>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();

        // Nothing is written before the marker: the channel is FIFO and empty.
        let _ = out_tx.send(Outbound::Marker);

        tasks.spawn(send_loop(dc, writer, out_rx, in_tx.clone(), cancel.clone()));
        tasks.spawn(recv_loop(dc, reader, read_buffer, in_tx, cancel.clone()));

        (Self { dc, outbound: out_tx, cancel }, in_rx)
    }

    pub fn dc(&self) -> i32 {
        self.dc
    }

    /// Queue one payload for sending.
    ///
    /// A payload the abridged header cannot describe is refused here, leaving
    /// the connection open.
    pub fn send(&self, payload: Vec<u8>) -> Result<(), TransportError> {
        if self.cancel.is_cancelled() {
            return Err(TransportError::Closed);
        }
        let mut header = Vec::with_capacity(4);
        transport::encode_header(payload.len(), &mut header)?;
        self.outbound.send(Outbound::Frame { header, payload }).map_err(|_| TransportError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.outbound.is_closed()
    }

    /// Stop both loops.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

async fn send_loop<S: AsyncWrite>(
    dc: i32,
    mut writer: WriteHalf<S>,
    mut queue: mpsc::UnboundedReceiver<Outbound>,
    errors: mpsc::UnboundedSender<Inbound>,
    cancel: CancellationToken,
) {
    tracing::trace!("[conn] DC{dc} send loop started");
    loop {
        let item = tokio::select! {
            _ = cancel.cancelled() => break,
            item = queue.recv() => item,
        };
        let Some(item) = item else { break };

        let result = match item {
            Outbound::Marker => writer.write_all(&[transport::MARKER]).await.map_err(TransportError::from),
            Outbound::Frame { header, payload } => write_frame(&mut writer, &header, &payload).await,
        };
        if let Err(e) = result {
            tracing::warn!("[conn] DC{dc} send failed: {e}");
            let _ = errors.send(Err(e));
            cancel.cancel();
            break;
        }
    }
    tracing::trace!("[conn] DC{dc} send loop stopped");
}

async fn write_frame<W: AsyncWrite>(
    writer: &mut WriteHalf<W>,
    header: &[u8],
    payload: &[u8],
) -> Result<(), TransportError> {
    tracing::trace!("[conn] sending {} bytes", payload.len());
    writer.write_all(header).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

async fn recv_loop<S: AsyncRead>(
    dc: i32,
    mut reader: ReadHalf<S>,
    read_buffer: usize,
    frames: mpsc::UnboundedSender<Inbound>,
    cancel: CancellationToken,
) {
    tracing::trace!("[conn] DC{dc} receive loop started");
    let mut buf = vec![0u8; read_buffer.max(1)];
    let mut decoder = FrameDecoder::new();

    let failure = 'read: loop {
        let read = tokio::select! {
            _ = cancel.cancelled() => break 'read None,
            read = reader.read(&mut buf) => read,
        };
        let n = match read {
            Ok(0) => break 'read Some(TransportError::Closed),
            Ok(n) => n,
            Err(e) => break 'read Some(TransportError::Io(e)),
        };
        tracing::trace!("[conn] DC{dc} read {n} bytes");
        decoder.push(&buf[..n]);

        loop {
            match decoder.next_frame() {
                Ok(Some(frame)) => {
                    if frames.send(Ok(frame)).is_err() {
                        break 'read None;
                    }
                }
                Ok(None) => break,
                Err(e) => break 'read Some(TransportError::from(e)),
            }
        }
    };

    if let Some(e) = failure {
        tracing::warn!("[conn] DC{dc} connection ended: {e}");
        let _ = frames.send(Err(e));
    }
    cancel.cancel();
    tracing::trace!("[conn] DC{dc} receive loop stopped");
}
