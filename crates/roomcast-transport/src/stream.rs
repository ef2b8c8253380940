//! Newline-framed transport over plain byte streams.
//!
//! Every frame is one line of UTF-8 text terminated by `\n`. This is the
//! framing a JSON stream encoder produces, so any client that writes one
//! JSON value per line can talk to the relay over raw TCP.

use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// Largest frame accepted by default (16 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// A [`Transport`] that accepts raw TCP connections.
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

    /// Sets the maximum frame length for connections accepted from now on.
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
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

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%addr, error = %e, "failed to set TCP_NODELAY");
        }

        let conn = StreamConnection::new(stream, self.max_frame_len);
        tracing::debug!(id = %conn.id(), %addr, "accepted TCP connection");
        Ok(conn)
    }

    fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// A newline-framed connection over a TCP socket.
pub type TcpConnection = StreamConnection<TcpStream>;

/// A newline-framed connection over any bidirectional byte stream.
///
/// The stream is split into independently locked read and write halves,
/// so a task waiting in [`recv`](Connection::recv) never holds up a
/// concurrent [`send`](Connection::send).
pub struct StreamConnection<S> {
    id: ConnectionId,
    max_frame_len: usize,
    reader: Mutex<FramedRead<ReadHalf<S>, LinesCodec>>,
    writer: Mutex<FramedWrite<WriteHalf<S>, LinesCodec>>,
}

impl<S> StreamConnection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wraps a stream, allocating a fresh [`ConnectionId`].
    pub fn new(stream: S, max_frame_len: usize) -> Self {
        let (read, write) = tokio::io::split(stream);
        Self {
            id: ConnectionId::next(),
            max_frame_len,
            reader: Mutex::new(FramedRead::new(
                read,
                LinesCodec::new_with_max_length(max_frame_len),
            )),
            writer: Mutex::new(FramedWrite::new(write, LinesCodec::new())),
        }
    }

    fn map_codec_error(
        &self,
        err: LinesCodecError,
        io: fn(std::io::Error) -> TransportError,
    ) -> TransportError {
        match err {
            LinesCodecError::MaxLineLengthExceeded => TransportError::FrameTooLong {
                max: self.max_frame_len,
            },
            LinesCodecError::Io(e) => io(e),
        }
    }
}

impl<S> Connection for StreamConnection<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if data.len() > self.max_frame_len {
            return Err(TransportError::FrameTooLong {
                max: self.max_frame_len,
            });
        }
        let line = std::str::from_utf8(data).map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                e,
            ))
        })?;
        if line.contains('\n') {
            return Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "frame contains a line break",
            )));
        }

        self.writer
            .lock()
            .await
            .send(line)
            .await
            .map_err(|e| self.map_codec_error(e, TransportError::SendFailed))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        loop {
            match reader.next().await {
                // Blank lines are whitespace between values, not frames.
                Some(Ok(line)) if line.trim().is_empty() => continue,
                Some(Ok(line)) => return Ok(Some(line.into_bytes())),
                Some(Err(e)) => {
                    return Err(self.map_codec_error(e, TransportError::ReceiveFailed));
                }
                None => return Ok(None),
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        // `LinesCodec` encodes any `AsRef<str>`, so the sink item is named here.
        let mut writer = self.writer.lock().await;
        SinkExt::<&str>::close(&mut *writer)
            .await
            .map_err(|e| self.map_codec_error(e, TransportError::SendFailed))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
