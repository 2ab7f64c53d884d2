//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
///
/// The decode variants are deliberately split three ways because the
/// router reacts differently to each: a malformed body and a missing
/// `type` field are logged and dropped, an unknown `type` is logged as
/// such, and none of them produce a response to the client.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound message failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The body is not valid JSON, or its fields don't match the
    /// declared message type.
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The body is a JSON object but carries no `type` string field.
    #[error("message has no type field")]
    MissingType,

    /// The `type` field names no known client message.
    #[error("unknown message type: {0}")]
    UnknownType(String),
}
