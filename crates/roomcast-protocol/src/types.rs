//! Core protocol types for roomcast's wire format.
//!
//! A [`Message`] is the only thing that travels on the wire. On a newline
//! framed stream it looks like:
//!
//! ```text
//! {"Type":"hello","Content":"cm9vbUE="}
//! {"Type":"pkg","Content":"aGk="}
//! ```
//!
//! `Content` is standard base64 so arbitrary bytes survive the JSON trip.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Tag of the join handshake message.
pub const HELLO: &str = "hello";

/// Tag of an opaque application payload.
pub const PKG: &str = "pkg";

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifier of a member within one room.
///
/// Allocated by the room from a counter starting at 0. Ids are never
/// reused while the room exists, so a stale id can never alias a newer
/// member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// The name of a room, taken verbatim from the handshake content.
///
/// Names are raw bytes; they are not required to be UTF-8. Two names are
/// the same room only if their bytes are identical.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomName(Vec<u8>);

impl RoomName {
    /// Creates a room name from raw bytes.
    pub fn new(name: impl Into<Vec<u8>>) -> Self {
        Self(name.into())
    }

    /// Returns the raw bytes of the name.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for RoomName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for RoomName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<Vec<u8>> for RoomName {
    fn from(name: Vec<u8>) -> Self {
        Self(name)
    }
}

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// The type tag of a [`Message`].
///
/// Serialized as a plain string. Tags the relay doesn't know about are
/// kept in [`Kind::Other`] so dispatch stays an exhaustive `match`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Kind {
    /// Join handshake; content is the room name.
    Hello,
    /// Opaque application payload, relayed verbatim.
    Pkg,
    /// Any other tag.
    Other(String),
}

impl Kind {
    /// Returns the wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hello => HELLO,
            Self::Pkg => PKG,
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for Kind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            HELLO => Self::Hello,
            PKG => Self::Pkg,
            _ => Self::Other(tag),
        }
    }
}

impl From<&str> for Kind {
    fn from(tag: &str) -> Self {
        Self::from(tag.to_string())
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// The unit exchanged between clients and the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// What kind of message this is.
    #[serde(rename = "Type", alias = "type")]
    pub kind: Kind,

    /// Opaque content. A `null` or missing field decodes as empty.
    #[serde(rename = "Content", alias = "content", default, with = "base64_content")]
    pub content: Vec<u8>,
}

impl Message {
    /// Creates a message with an arbitrary kind.
    pub fn new(kind: impl Into<Kind>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: kind.into(),
            content: content.into(),
        }
    }

    /// Creates the handshake message for joining `room`.
    pub fn hello(room: impl Into<RoomName>) -> Self {
        Self {
            kind: Kind::Hello,
            content: room.into().0,
        }
    }

    /// Creates a payload message.
    pub fn pkg(content: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: Kind::Pkg,
            content: content.into(),
        }
    }

    /// Returns the room this message asks to join, if it is a handshake.
    pub fn room_name(&self) -> Option<RoomName> {
        match self.kind {
            Kind::Hello => Some(RoomName::new(self.content.clone())),
            Kind::Pkg | Kind::Other(_) => None,
        }
    }
}

mod base64_content {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(content))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(encoded) => STANDARD
                .decode(encoded.as_bytes())
                .map_err(serde::de::Error::custom),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_id_display() {
        assert_eq!(MemberId(3).to_string(), "M-3");
    }

    #[test]
    fn test_room_name_display_is_lossy() {
        let name = RoomName::new(vec![b'a', 0xff, b'b']);
        assert_eq!(name.to_string(), "a\u{fffd}b");
        assert_eq!(name.as_bytes(), &[b'a', 0xff, b'b']);
    }

    #[test]
    fn test_room_names_compare_by_bytes() {
        assert_eq!(RoomName::from("roomA"), RoomName::new(b"roomA".to_vec()));
        assert_ne!(RoomName::from("roomA"), RoomName::from("rooma"));
    }

    #[test]
    fn test_kind_from_known_tags() {
        assert_eq!(Kind::from("hello"), Kind::Hello);
        assert_eq!(Kind::from("pkg"), Kind::Pkg);
        assert_eq!(Kind::from("ping"), Kind::Other("ping".into()));
    }

    #[test]
    fn test_kind_tags_are_case_sensitive() {
        assert_eq!(Kind::from("Hello"), Kind::Other("Hello".into()));
    }

    #[test]
    fn test_hello_json_format() {
        let json = serde_json::to_value(Message::hello("roomA")).unwrap();
        assert_eq!(json["Type"], "hello");
        assert_eq!(json["Content"], "cm9vbUE=");
    }

    #[test]
    fn test_pkg_decodes_from_wire() {
        let msg: Message =
            serde_json::from_str(r#"{"Type":"pkg","Content":"aGk="}"#).unwrap();
        assert_eq!(msg, Message::pkg(b"hi".to_vec()));
    }

    #[test]
    fn test_null_and_missing_content_decode_as_empty() {
        let null: Message = serde_json::from_str(r#"{"Type":"pkg","Content":null}"#).unwrap();
        let missing: Message = serde_json::from_str(r#"{"Type":"pkg"}"#).unwrap();
        assert!(null.content.is_empty());
        assert!(missing.content.is_empty());
    }

    #[test]
    fn test_lowercase_field_names_accepted() {
        let msg: Message =
            serde_json::from_str(r#"{"type":"hello","content":"cm9vbUE="}"#).unwrap();
        assert_eq!(msg.room_name(), Some(RoomName::from("roomA")));
    }

    #[test]
    fn test_unknown_kind_survives_round_trip() {
        let msg = Message::new("clipboard-image", vec![1, 2, 3]);
        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: Message = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded.kind, Kind::Other("clipboard-image".into()));
        assert_eq!(decoded.content, vec![1, 2, 3]);
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let result: Result<Message, _> =
            serde_json::from_str(r#"{"Type":"pkg","Content":"not base64!"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_room_name_only_for_hello() {
        assert_eq!(Message::hello("x").room_name(), Some(RoomName::from("x")));
        assert_eq!(Message::pkg(b"x".to_vec()).room_name(), None);
    }
}
