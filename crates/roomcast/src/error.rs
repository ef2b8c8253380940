//! Unified error type for roomcast.

use roomcast_protocol::ProtocolError;
use roomcast_transport::TransportError;

/// Top-level error that wraps the crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoomcastError {
    /// A transport-level error (bind, accept).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error, such as a failed handshake.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
