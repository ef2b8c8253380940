//! Wire protocol for roomcast.
//!
//! This crate defines what clients and the relay say to each other:
//!
//! - **Types** ([`Message`], [`Kind`], [`RoomName`], [`MemberId`]) —
//!   the structures that travel on the wire and identify rooms/members.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how messages are
//!   converted to and from frame bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while doing so.
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (Message) → Session (PeerConnection)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{HELLO, Kind, MemberId, Message, PKG, RoomName};
