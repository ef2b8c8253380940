//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing `Type`, or `Content`
    /// that isn't valid base64.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but breaks a protocol rule, such as a
    /// connection whose first message isn't a handshake.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
