//! Per-connection handler: handshake, receive loop, and close watcher.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive the first message → it must be `hello` naming a room
//!   2. Join the room → spawn a watcher that leaves it on close
//!   3. Loop: receive messages → broadcast payloads to the other members

use std::sync::Arc;

use roomcast_protocol::{HELLO, Kind, ProtocolError};
use roomcast_room::Membership;
use roomcast_session::PeerConnection;
use roomcast_transport::Connection;

use crate::RoomcastError;
use crate::server::ServerState;

/// Drop guard that closes the connection when the handler exits.
///
/// Closing fires the close signal, which is what makes the watcher remove
/// the member from its room. This keeps that true even if the handler
/// task panics or is aborted. Since `Drop` is synchronous, the async
/// close runs on a fire-and-forget task.
struct CloseGuard<C: Connection> {
    peer: Arc<PeerConnection<C>>,
}

impl<C: Connection> Drop for CloseGuard<C> {
    fn drop(&mut self) {
        if self.peer.is_closed() {
            return;
        }
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let peer = Arc::clone(&self.peer);
            runtime.spawn(async move { peer.close().await });
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Connection>(
    conn: C,
    state: Arc<ServerState<C>>,
) -> Result<(), RoomcastError> {
    let peer = Arc::new(PeerConnection::new(conn, state.session));
    let _guard = CloseGuard {
        peer: Arc::clone(&peer),
    };
    let conn_id = peer.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Handshake ---
    let membership = perform_handshake(&peer, &state).await?;
    let room = membership.room().name().clone();
    let member = membership.id();

    // --- Step 2: Close watcher ---
    tokio::spawn(watch_for_close(membership.clone(), Arc::clone(&state)));

    // --- Step 3: Receive loop ---
    while let Some(msg) = peer.receive().await {
        match &msg.kind {
            Kind::Pkg => {
                membership.broadcast(&msg).await;
            }
            Kind::Other(_) if state.forward_unknown_kinds => {
                membership.broadcast(&msg).await;
            }
            Kind::Other(tag) => {
                tracing::debug!(%conn_id, %room, %member, kind = %tag, "dropping message of unknown kind");
            }
            Kind::Hello => {
                tracing::debug!(%conn_id, %room, %member, "ignoring hello from joined member");
            }
        }
    }

    tracing::info!(
        %conn_id,
        %room,
        %member,
        reason = ?peer.close_reason(),
        "session ended"
    );
    Ok(())
}

/// Reads the first message and joins the room it names.
async fn perform_handshake<C: Connection>(
    peer: &Arc<PeerConnection<C>>,
    state: &ServerState<C>,
) -> Result<Membership<C>, RoomcastError> {
    let conn_id = peer.id();

    let Some(first) = peer.receive().await else {
        tracing::info!(
            %conn_id,
            reason = ?peer.close_reason(),
            "connection closed before joining a room"
        );
        return Err(ProtocolError::InvalidMessage(
            "connection closed before handshake".into(),
        )
        .into());
    };

    let Some(name) = first.room_name() else {
        tracing::warn!(%conn_id, kind = %first.kind, "first message was not a hello");
        peer.close().await;
        return Err(ProtocolError::InvalidMessage(format!(
            "first message must be {HELLO}, got {}",
            first.kind
        ))
        .into());
    };

    Ok(state.registry.join(&name, Arc::clone(peer)))
}

/// Waits for the connection to close, then removes the member.
async fn watch_for_close<C: Connection>(membership: Membership<C>, state: Arc<ServerState<C>>) {
    membership.connection().closed().await;
    state.registry.leave(&membership);
}
