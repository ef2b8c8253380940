//! Room registry configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the room registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Remove a room from the registry as soon as its last member leaves.
    ///
    /// Off by default: rooms live for the whole process, which keeps
    /// every name mapped to one room for as long as the server runs.
    pub evict_empty_rooms: bool,
}
