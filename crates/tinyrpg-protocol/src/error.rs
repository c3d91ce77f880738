//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum — a
//! `ProtocolError` always means a serialization problem, never a
//! networking or game-rule one.

/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or an
    /// unrecognized `request`/`response` tag.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
