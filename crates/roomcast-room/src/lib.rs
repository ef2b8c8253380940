//! Rooms and membership for roomcast.
//!
//! A room is a named broadcast group. Members join by connection, get a
//! room-local [`MemberId`], and receive every message other members send.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — name → room lookup with get-or-create semantics
//! - [`Room`] — membership table and fan-out broadcast
//! - [`Membership`] — one member's handle on its room
//! - [`RoomConfig`] — registry settings (empty-room eviction)
//!
//! # Locking
//!
//! Both the registry map and each room's membership table sit behind a
//! reader/writer lock. Locks only ever guard the in-memory index; every
//! network write happens after the lock is released.
//!
//! [`MemberId`]: roomcast_protocol::MemberId

mod config;
mod error;
mod registry;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{Membership, Room};
