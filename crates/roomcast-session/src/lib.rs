//! Peer connections for roomcast.
//!
//! A [`PeerConnection`] wraps one transport connection and turns it into
//! something the room layer can use without caring about I/O failures:
//!
//! 1. **Typed messages** — `send`/`receive` move whole [`Message`]s
//! 2. **Deadlines** — every read and write is bounded ([`SessionConfig`])
//! 3. **One closed state** — any failure closes the connection, and any
//!    number of tasks can wait for that to happen
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← broadcasts through PeerConnection::send
//!     ↕
//! Session Layer (this crate)  ← deadlines, decoding, close signal
//!     ↕
//! Transport + Protocol (below)  ← frames and codecs
//! ```
//!
//! [`Message`]: roomcast_protocol::Message

mod peer;
mod session;

pub use peer::PeerConnection;
pub use session::{CloseReason, SessionConfig};
