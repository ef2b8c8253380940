//! Error types for the room layer.

use roomcast_protocol::RoomName;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room was evicted from the registry while empty and no longer
    /// accepts members. Resolve the name again to get its successor.
    #[error("room {0} has been retired")]
    Retired(RoomName),
}
