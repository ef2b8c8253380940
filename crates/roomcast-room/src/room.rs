//! A room: a membership table plus fan-out broadcast.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::RwLock;
use roomcast_protocol::{MemberId, Message, RoomName};
use roomcast_session::PeerConnection;
use roomcast_transport::Connection;

use crate::RoomError;

/// A named group of connected members.
///
/// Rooms are created by the [`RoomRegistry`](crate::RoomRegistry) and
/// shared behind an `Arc`. Every member gets an id from a counter that
/// only moves forward, so ids are never reused within one room.
pub struct Room<C: Connection> {
    name: RoomName,
    members: RwLock<Members<C>>,
}

struct Members<C: Connection> {
    by_id: BTreeMap<MemberId, Arc<PeerConnection<C>>>,
    next_id: u64,
    /// Set when the registry evicts the room; no joins after that.
    retired: bool,
}

impl<C: Connection> Room<C> {
    pub(crate) fn new(name: RoomName) -> Self {
        Self {
            name,
            members: RwLock::new(Members {
                by_id: BTreeMap::new(),
                next_id: 0,
                retired: false,
            }),
        }
    }

    /// Returns the room's name.
    pub fn name(&self) -> &RoomName {
        &self.name
    }

    /// Adds a connection to the room and returns its new member id.
    ///
    /// # Errors
    /// Returns [`RoomError::Retired`] if the room has been evicted.
    pub fn join(&self, conn: Arc<PeerConnection<C>>) -> Result<MemberId, RoomError> {
        let (id, count) = {
            let mut members = self.members.write();
            if members.retired {
                return Err(RoomError::Retired(self.name.clone()));
            }
            let id = MemberId(members.next_id);
            members.next_id += 1;
            members.by_id.insert(id, conn);
            (id, members.by_id.len())
        };

        tracing::info!(room = %self.name, member = %id, members = count, "member joined");
        Ok(id)
    }

    /// Removes a member. Returns `false` if it was already gone.
    pub fn leave(&self, id: MemberId) -> bool {
        let (removed, count) = {
            let mut members = self.members.write();
            let removed = members.by_id.remove(&id).is_some();
            (removed, members.by_id.len())
        };

        if removed {
            tracing::info!(room = %self.name, member = %id, members = count, "member left");
        }
        removed
    }

    /// Sends `msg` to every current member except `excluding`.
    ///
    /// The recipient list is copied under the read lock and the lock is
    /// released before any I/O. Sends run concurrently and independently:
    /// a slow or dead recipient only affects itself. Returns the number of
    /// recipients the message was handed to.
    pub async fn broadcast(&self, msg: &Message, excluding: MemberId) -> usize {
        let recipients: Vec<Arc<PeerConnection<C>>> = {
            let members = self.members.read();
            members
                .by_id
                .iter()
                .filter(|(id, _)| **id != excluding)
                .map(|(_, conn)| Arc::clone(conn))
                .collect()
        };

        join_all(recipients.iter().map(|conn| conn.send(msg))).await;

        tracing::trace!(
            room = %self.name,
            from = %excluding,
            kind = %msg.kind,
            recipients = recipients.len(),
            "broadcast"
        );
        recipients.len()
    }

    /// Returns the number of current members.
    pub fn len(&self) -> usize {
        self.members.read().by_id.len()
    }

    /// Returns `true` if the room has no members.
    pub fn is_empty(&self) -> bool {
        self.members.read().by_id.is_empty()
    }

    /// Returns the ids of current members in ascending order.
    pub fn member_ids(&self) -> Vec<MemberId> {
        self.members.read().by_id.keys().copied().collect()
    }

    /// Returns `true` once the registry has evicted this room.
    pub fn is_retired(&self) -> bool {
        self.members.read().retired
    }

    /// Marks the room retired if, and only if, it is empty right now.
    ///
    /// Emptiness is checked under the write lock so no join can slip in
    /// between the check and the flag.
    pub(crate) fn retire_if_empty(&self) -> bool {
        let mut members = self.members.write();
        if members.by_id.is_empty() {
            members.retired = true;
        }
        members.retired
    }
}

/// One member's handle on the room it joined.
///
/// Holds the room (shared, not owned), the member's id and its connection.
/// Returned by [`RoomRegistry::join`](crate::RoomRegistry::join).
pub struct Membership<C: Connection> {
    pub(crate) room: Arc<Room<C>>,
    pub(crate) id: MemberId,
    pub(crate) conn: Arc<PeerConnection<C>>,
}

impl<C: Connection> Membership<C> {
    /// Returns this member's id within its room.
    pub fn id(&self) -> MemberId {
        self.id
    }

    /// Returns the room this member belongs to.
    pub fn room(&self) -> &Arc<Room<C>> {
        &self.room
    }

    /// Returns this member's connection.
    pub fn connection(&self) -> &Arc<PeerConnection<C>> {
        &self.conn
    }

    /// Broadcasts `msg` to every other member of the room.
    pub async fn broadcast(&self, msg: &Message) -> usize {
        self.room.broadcast(msg, self.id).await
    }
}

// Manual impl: deriving would require `C: Clone`.
impl<C: Connection> Clone for Membership<C> {
    fn clone(&self) -> Self {
        Self {
            room: Arc::clone(&self.room),
            id: self.id,
            conn: Arc::clone(&self.conn),
        }
    }
}
