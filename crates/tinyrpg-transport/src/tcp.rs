//! TCP transport with newline-delimited message framing.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Default cap on a single frame. A session snapshot is well under 2 KiB;
/// anything approaching the cap is a misbehaving peer.
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024;

/// A TCP-based [`Transport`] that listens for incoming connections.
pub struct TcpTransport {
    listener: TcpListener,
    max_frame_len: usize,
}

impl TcpTransport {
    /// Binds a new TCP transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self {
            listener,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        })
    }

    /// Overrides the per-frame length cap.
    pub fn max_frame_len(mut self, max: usize) -> Self {
        self.max_frame_len = max.max(1);
        self
    }

    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        // Request/response traffic; don't let Nagle batch tiny frames.
        stream
            .set_nodelay(true)
            .map_err(TransportError::AcceptFailed)?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, %addr, "accepted TCP connection");

        let (read, write) = stream.into_split();
        Ok(TcpConnection {
            id,
            reader: Mutex::new(BufReader::new(read)),
            writer: Mutex::new(write),
            max_frame_len: self.max_frame_len,
        })
    }
}

/// A single TCP connection carrying newline-delimited frames.
pub struct TcpConnection {
    id: ConnectionId,
    reader: Mutex<BufReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
    max_frame_len: usize,
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)?;
        writer
            .write_all(b"\n")
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        let mut frame = Vec::new();

        // Bound the read so an endless unterminated line can't grow the
        // buffer forever.
        let limit = self.max_frame_len as u64 + 1;
        let n = (&mut *reader)
            .take(limit)
            .read_until(b'\n', &mut frame)
            .await
            .map_err(TransportError::ReceiveFailed)?;

        if n == 0 {
            return Ok(None); // clean EOF between frames
        }
        if frame.last() != Some(&b'\n') {
            if frame.len() as u64 >= limit {
                return Err(TransportError::MessageTooLong(self.max_frame_len));
            }
            return Err(TransportError::ReceiveFailed(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "eof while reading frame",
            )));
        }

        frame.pop();
        if frame.last() == Some(&b'\r') {
            frame.pop();
        }
        Ok(Some(frame))
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
