//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec turns a [`Message`](crate::Message) into one transport frame
//! and back. The framing itself (lines, WebSocket frames) belongs to the
//! transport layer; a codec only ever sees complete frames.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to frame bytes and decode them back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes one frame into a freshly allocated value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses compact JSON (via `serde_json`).
///
/// Compact output never contains a raw line break, so every encoded
/// message fits on a single line of a newline-framed stream.
///
/// ## Example
///
/// ```rust
/// use roomcast_protocol::{Codec, JsonCodec, Message};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Message::hello("roomA")).unwrap();
/// assert_eq!(bytes, br#"{"Type":"hello","Content":"cm9vbUE="}"#);
///
/// let decoded: Message = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, Message::hello("roomA"));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
