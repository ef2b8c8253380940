//! The peer connection: typed messages over a transport connection.
//!
//! All I/O failures (transport errors, undecodable frames, expired
//! deadlines, the peer hanging up) collapse into a single closed state.
//! Callers never see an error; they see `receive()` return `None` and
//! can check [`PeerConnection::close_reason`] if they want to log why.

use std::sync::OnceLock;

use roomcast_protocol::{Codec, JsonCodec, Message};
use roomcast_transport::{Connection, ConnectionId};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{CloseReason, SessionConfig};

/// A transport connection that speaks [`Message`]s.
///
/// Safe to share across tasks behind an `Arc`: one task typically sits in
/// [`receive`](Self::receive) while others [`send`](Self::send) to it and
/// a watcher waits in [`closed`](Self::closed).
pub struct PeerConnection<C: Connection> {
    conn: C,
    codec: JsonCodec,
    config: SessionConfig,
    /// Set exactly once, by whichever path closes the connection first.
    reason: OnceLock<CloseReason>,
    /// Fired right after `reason` is set.
    closed: CancellationToken,
}

impl<C: Connection> PeerConnection<C> {
    /// Wraps a transport connection.
    pub fn new(conn: C, config: SessionConfig) -> Self {
        Self {
            conn,
            codec: JsonCodec,
            config,
            reason: OnceLock::new(),
            closed: CancellationToken::new(),
        }
    }

    /// Returns the underlying connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Returns `true` once the connection has been closed.
    pub fn is_closed(&self) -> bool {
        self.reason.get().is_some()
    }

    /// Returns why the connection was closed, or `None` while it's open.
    pub fn close_reason(&self) -> Option<CloseReason> {
        self.reason.get().copied()
    }

    /// Sends one message under the write deadline.
    ///
    /// Does nothing if the connection is already closed. A failed or
    /// timed-out write closes the connection; an in-flight write is
    /// abandoned as soon as the connection is closed from elsewhere.
    /// The write and any teardown it triggers share one deadline, so a
    /// stalled peer holds the caller for at most `write_timeout`.
    pub async fn send(&self, msg: &Message) {
        if self.is_closed() {
            return;
        }

        let frame = match self.codec.encode(msg) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(id = %self.id(), error = %e, "failed to encode message");
                return;
            }
        };

        let deadline = Instant::now() + self.config.write_timeout;
        let result = tokio::select! {
            _ = self.closed.cancelled() => return,
            result = tokio::time::timeout_at(deadline, self.conn.send(&frame)) => result,
        };

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(id = %self.id(), error = %e, "send failed");
                self.close_with(CloseReason::Transport, deadline).await;
            }
            Err(_) => {
                tracing::debug!(id = %self.id(), "write deadline expired");
                self.close_with(CloseReason::Timeout, deadline).await;
            }
        }
    }

    /// Waits for the next message under the read deadline.
    ///
    /// Returns `None` if the connection is (or becomes) closed. Every
    /// failure closes the connection before returning `None`, so
    /// `is_closed()` is always `true` after a `None`.
    pub async fn receive(&self) -> Option<Message> {
        if self.is_closed() {
            return None;
        }

        let result = tokio::select! {
            _ = self.closed.cancelled() => return None,
            result = tokio::time::timeout(self.config.read_timeout, self.conn.recv()) => result,
        };

        let reason = match result {
            Ok(Ok(Some(frame))) => match self.codec.decode::<Message>(&frame) {
                Ok(msg) => return Some(msg),
                Err(e) => {
                    tracing::debug!(id = %self.id(), error = %e, "undecodable frame");
                    CloseReason::Protocol
                }
            },
            Ok(Ok(None)) => CloseReason::PeerClosed,
            Ok(Err(e)) => {
                tracing::debug!(id = %self.id(), error = %e, "receive failed");
                CloseReason::Transport
            }
            Err(_) => CloseReason::Timeout,
        };

        self.close_with(reason, self.close_deadline()).await;
        None
    }

    /// Closes the connection. Idempotent.
    pub async fn close(&self) {
        self.close_with(CloseReason::Local, self.close_deadline()).await;
    }

    /// Resolves once the connection is closed.
    ///
    /// Any number of tasks may wait here; all of them wake on the first
    /// close, and waiters that arrive afterwards return immediately.
    pub async fn closed(&self) {
        self.closed.cancelled().await;
    }

    fn close_deadline(&self) -> Instant {
        Instant::now() + self.config.write_timeout
    }

    /// Records `reason`, wakes every waiter, then tears the transport down.
    ///
    /// The transport close flushes buffered output, which stalls against a
    /// peer that stopped reading. It gets whatever is left of `deadline`
    /// and is abandoned after that; the socket itself is released when the
    /// last handle to this connection is dropped.
    async fn close_with(&self, reason: CloseReason, deadline: Instant) {
        if self.reason.set(reason).is_err() {
            return;
        }
        self.closed.cancel();
        tracing::debug!(id = %self.id(), %reason, "connection closed");

        match tokio::time::timeout_at(deadline, self.conn.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(id = %self.id(), error = %e, "transport close failed");
            }
            Err(_) => {
                tracing::debug!(id = %self.id(), "transport close timed out");
            }
        }
    }
}
