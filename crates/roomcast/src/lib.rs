//! # roomcast
//!
//! A connection-oriented broadcast relay. Clients connect, send a `hello`
//! naming a room, and from then on every message they send is forwarded
//! to everyone else in that room.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomcast::prelude::*;
//!
//! # async fn run() -> Result<(), RoomcastError> {
//! let server = RelayServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::RelayConfig;
pub use error::RoomcastError;
pub use server::{Relay, RelayServer, RelayServerBuilder};

pub mod prelude {
    //! Everything needed to run or embed a relay.

    pub use crate::{Relay, RelayConfig, RelayServer, RelayServerBuilder, RoomcastError};
    pub use roomcast_protocol::{Kind, MemberId, Message, RoomName};
    pub use roomcast_room::{Membership, Room, RoomConfig, RoomRegistry};
    pub use roomcast_session::{CloseReason, PeerConnection, SessionConfig};
    pub use roomcast_transport::{
        Connection, StreamConnection, TcpConnection, TcpTransport, Transport,
        WebSocketConnection, WebSocketTransport,
    };
}
