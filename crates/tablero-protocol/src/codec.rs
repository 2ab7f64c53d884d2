//! Codec trait and the JSON implementation.
//!
//! A codec converts between Rust types and text frames. The rest of the
//! server only depends on the [`Codec`] trait, so the wire encoding can
//! be swapped without touching routing or registry code; in practice the
//! protocol is JSON and [`JsonCodec`] is the implementation used.

use serde::{de::DeserializeOwned, Serialize};

use crate::{ClientMessage, ProtocolError};

/// Encodes values to text frames and decodes frames back.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into a text frame.
    fn encode<T: Serialize>(&self, value: &T)
        -> Result<String, ProtocolError>;

    /// Deserializes a text frame into a value.
    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError>;

    /// Decodes an inbound client message, classifying failures.
    ///
    /// The classification drives the router's error handling:
    /// [`ProtocolError::Malformed`] and [`ProtocolError::MissingType`]
    /// for bodies that can't be interpreted at all, and
    /// [`ProtocolError::UnknownType`] for a well-formed body whose
    /// `type` this server doesn't speak.
    fn decode_inbound(
        &self,
        text: &str,
    ) -> Result<ClientMessage, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] over `serde_json`.
///
/// ## Example
///
/// ```rust
/// use tablero_protocol::{Codec, ClientMessage, JsonCodec};
///
/// let codec = JsonCodec;
/// let msg = codec
///     .decode_inbound(r#"{"type":"create_room","playerName":"Ann"}"#)
///     .unwrap();
/// assert!(matches!(msg, ClientMessage::CreateRoom { .. }));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    fn decode_inbound(
        &self,
        text: &str,
    ) -> Result<ClientMessage, ProtocolError> {
        // Peek at the tag first: serde reports an unknown variant and a
        // missing field with the same error type, but the server must
        // tell them apart (unknown types are ignored by design).
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(ProtocolError::Malformed)?;

        let tag = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(ProtocolError::MissingType)?
            .to_owned();

        if !ClientMessage::KNOWN_TYPES.contains(&tag.as_str()) {
            return Err(ProtocolError::UnknownType(tag));
        }

        serde_json::from_value(value).map_err(ProtocolError::Malformed)
    }
}
