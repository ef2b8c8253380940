//! Relay configuration.

use roomcast_room::RoomConfig;
use roomcast_session::SessionConfig;

/// Behavior settings shared by every connection a relay serves.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Read/write deadlines for each connection.
    pub session: SessionConfig,

    /// Room registry settings.
    pub rooms: RoomConfig,

    /// Relay messages whose kind is neither `hello` nor `pkg`.
    ///
    /// Default: `true`. Payloads are opaque to the relay, so clients are
    /// free to define their own kinds. Set to `false` to relay only `pkg`.
    pub forward_unknown_kinds: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            rooms: RoomConfig::default(),
            forward_unknown_kinds: true,
        }
    }
}
