//! Frame-level I/O for the relay.
//!
//! A [`Connection`] moves whole frames, never partial byte runs: one
//! `send` puts exactly one encoded message on the wire and one `recv`
//! hands back exactly one. How a frame is delimited is the transport's
//! business. [`TcpTransport`] ends each frame with `\n`; the WebSocket
//! transport maps one frame to one data message.
//!
//! Enable the default `websocket` feature for [`WebSocketTransport`].

mod error;
mod stream;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use stream::{StreamConnection, TcpConnection, TcpTransport, DEFAULT_MAX_FRAME_LEN};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique tag for a connection, used as a log field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id. Mostly useful in tests and mock connections.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique connection ID.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A listener the relay's accept loop pulls connections from.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Resolves with the next connection that has finished any transport
    /// handshake and is ready to carry frames.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;

    /// The bound address; with port 0 this reports the port actually used.
    fn local_addr(&self) -> std::io::Result<SocketAddr>;
}

/// One client link, shared between the task reading it and every task
/// broadcasting into it.
///
/// A task parked in `recv` must never hold up a `send`, so implementations
/// lock their read and write sides separately.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes one frame and flushes it.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Reads the next frame. `Ok(None)` means the client hung up cleanly.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Flushes pending output and shuts down the write side.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn id(&self) -> ConnectionId;
}
