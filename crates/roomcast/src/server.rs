//! `RelayServer` builder, the embeddable `Relay` core, and the accept loop.
//!
//! This ties the layers together: transport → session → room.

use std::sync::Arc;
use std::time::Duration;

use roomcast_room::{RoomConfig, RoomRegistry};
use roomcast_session::SessionConfig;
use roomcast_transport::{
    Connection, DEFAULT_MAX_FRAME_LEN, TcpTransport, Transport, WebSocketTransport,
};

use crate::handler::handle_connection;
use crate::{RelayConfig, RoomcastError};

/// Pause after a failed accept so a persistent error (e.g. out of file
/// descriptors) doesn't spin the loop.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Shared state passed to each connection handler task.
pub(crate) struct ServerState<C: Connection> {
    pub(crate) registry: RoomRegistry<C>,
    pub(crate) session: SessionConfig,
    pub(crate) forward_unknown_kinds: bool,
}

/// The relay core: a room registry plus the per-connection session logic.
///
/// Cheap to clone; clones share the same registry. Use this directly to
/// serve connections that come from your own accept loop, or let
/// [`RelayServer`] drive it.
pub struct Relay<C: Connection> {
    state: Arc<ServerState<C>>,
}

impl<C: Connection> Relay<C> {
    /// Creates a relay with an empty room registry.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            state: Arc::new(ServerState {
                registry: RoomRegistry::new(config.rooms),
                session: config.session,
                forward_unknown_kinds: config.forward_unknown_kinds,
            }),
        }
    }

    /// Returns the room registry.
    pub fn registry(&self) -> &RoomRegistry<C> {
        &self.state.registry
    }

    /// Serves one connection until it closes.
    ///
    /// Returns an error only if the handshake fails; once the connection
    /// has joined a room, every way it can end counts as success.
    pub async fn serve(&self, conn: C) -> Result<(), RoomcastError> {
        handle_connection(conn, Arc::clone(&self.state)).await
    }
}

impl<C: Connection> Clone for Relay<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<C: Connection> Default for Relay<C> {
    fn default() -> Self {
        Self::new(RelayConfig::default())
    }
}

/// Builder for configuring and starting a relay server.
///
/// # Example
///
/// ```rust,ignore
/// use roomcast::prelude::*;
///
/// let server = RelayServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig { evict_empty_rooms: true })
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct RelayServerBuilder {
    bind_addr: String,
    max_frame_len: usize,
    config: RelayConfig,
}

impl RelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            config: RelayConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the read/write deadlines.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Sets the room registry configuration.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.config.rooms = config;
        self
    }

    /// Sets whether messages of unrecognized kinds are relayed.
    pub fn forward_unknown_kinds(mut self, forward: bool) -> Self {
        self.config.forward_unknown_kinds = forward;
        self
    }

    /// Sets the largest frame accepted on the TCP transport.
    pub fn max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Binds a newline-framed TCP server.
    pub async fn build(self) -> Result<RelayServer<TcpTransport>, RoomcastError> {
        let transport = TcpTransport::bind(&self.bind_addr)
            .await?
            .with_max_frame_len(self.max_frame_len);
        Ok(RelayServer {
            transport,
            relay: Relay::new(self.config),
        })
    }

    /// Binds a WebSocket server. Each WebSocket frame carries one message.
    pub async fn build_websocket(self) -> Result<RelayServer<WebSocketTransport>, RoomcastError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;
        Ok(RelayServer {
            transport,
            relay: Relay::new(self.config),
        })
    }
}

impl Default for RelayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A relay bound to a transport.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct RelayServer<T: Transport> {
    transport: T,
    relay: Relay<T::Connection>,
}

impl<T: Transport> RelayServer<T> {
    /// Creates a new builder.
    pub fn builder() -> RelayServerBuilder {
        RelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Returns the relay core, e.g. to inspect its rooms.
    pub fn relay(&self) -> &Relay<T::Connection> {
        &self.relay
    }

    /// Runs the accept loop.
    ///
    /// Spawns one task per accepted connection. Runs until the process
    /// is terminated.
    pub async fn run(mut self) -> Result<(), RoomcastError> {
        match self.transport.local_addr() {
            Ok(addr) => tracing::info!(%addr, "roomcast relay running"),
            Err(_) => tracing::info!("roomcast relay running"),
        }

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let relay = self.relay.clone();
                    tokio::spawn(async move {
                        if let Err(e) = relay.serve(conn).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}
