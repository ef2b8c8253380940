//! Room registry: resolves room names to rooms and tracks membership.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use roomcast_protocol::RoomName;
use roomcast_session::PeerConnection;
use roomcast_transport::Connection;

use crate::{Membership, Room, RoomConfig};

/// The single source of truth for which rooms exist.
///
/// Shared by every connection task behind an `Arc`. At most one [`Room`]
/// exists per name at any moment, even when many connections race to
/// join a name nobody has used yet.
///
/// Lock order: when both are held, the registry lock is taken before a
/// room's lock. Only eviction needs both.
pub struct RoomRegistry<C: Connection> {
    rooms: RwLock<HashMap<RoomName, Arc<Room<C>>>>,
    config: RoomConfig,
}

impl<C: Connection> RoomRegistry<C> {
    /// Creates an empty registry.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Returns the registry configuration.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Returns the room called `name`, creating it if it doesn't exist.
    pub fn resolve(&self, name: &RoomName) -> Arc<Room<C>> {
        if let Some(room) = self.rooms.read().get(name) {
            return Arc::clone(room);
        }

        // Re-check under the write lock: another task may have created
        // the room after our read lock was released.
        let mut rooms = self.rooms.write();
        let room = rooms.entry(name.clone()).or_insert_with(|| {
            tracing::info!(room = %name, "room created");
            Arc::new(Room::new(name.clone()))
        });
        Arc::clone(room)
    }

    /// Joins `conn` to the room called `name`, creating the room if needed.
    ///
    /// If the resolved room is evicted before the join lands, the name is
    /// resolved again, so this always ends in a live room.
    pub fn join(&self, name: &RoomName, conn: Arc<PeerConnection<C>>) -> Membership<C> {
        loop {
            let room = self.resolve(name);
            match room.join(Arc::clone(&conn)) {
                Ok(id) => return Membership { room, id, conn },
                Err(e) => {
                    tracing::debug!(room = %name, error = %e, "join raced eviction, retrying");
                }
            }
        }
    }

    /// Removes a member from its room. Idempotent.
    ///
    /// With [`RoomConfig::evict_empty_rooms`] set, a room left empty is
    /// evicted as well. Returns `false` if the member was already gone.
    pub fn leave(&self, membership: &Membership<C>) -> bool {
        let removed = membership.room.leave(membership.id);
        if self.config.evict_empty_rooms {
            self.evict_if_empty(&membership.room);
        }
        removed
    }

    /// Removes `room` from the registry if it currently has no members.
    ///
    /// Does nothing if the name already maps to a different room. Once
    /// evicted the room rejects joins, and the next `resolve` of its name
    /// creates a fresh room.
    pub fn evict_if_empty(&self, room: &Arc<Room<C>>) -> bool {
        let mut rooms = self.rooms.write();
        match rooms.get(room.name()) {
            Some(current) if Arc::ptr_eq(current, room) => {}
            _ => return false,
        }
        if !room.retire_if_empty() {
            return false;
        }
        rooms.remove(room.name());
        drop(rooms);

        tracing::info!(room = %room.name(), "empty room evicted");
        true
    }

    /// Returns the room called `name` without creating it.
    pub fn get(&self, name: &RoomName) -> Option<Arc<Room<C>>> {
        self.rooms.read().get(name).cloned()
    }

    /// Returns `true` if a room called `name` exists.
    pub fn contains(&self, name: &RoomName) -> bool {
        self.rooms.read().contains_key(name)
    }

    /// Returns the number of rooms.
    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    /// Returns `true` if no rooms exist.
    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }
}

impl<C: Connection> Default for RoomRegistry<C> {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
