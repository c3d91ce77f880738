//! Codec trait and implementations for serializing/deserializing messages.
//!
//! The protocol layer doesn't care how envelopes become bytes — it only
//! needs something that implements the [`Codec`] trait. [`JsonCodec`] is
//! the wire format the reference client speaks; a binary codec could be
//! swapped in behind the same trait without touching the router.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes protocol types to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because the codec is shared across every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed,
    /// truncated, or don't match the expected envelope shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON via `serde_json` — one object per frame,
/// exactly what the reference client sends and expects.
///
/// ## Example
///
/// ```rust
/// use tinyrpg_protocol::{Codec, JsonCodec, Request};
///
/// let codec = JsonCodec;
/// let bytes = codec.encode(&Request::JoinLobby("Aldric".into())).unwrap();
/// let decoded: Request = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, Request::JoinLobby("Aldric".into()));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ReasonCode, Response};

    #[test]
    fn test_json_codec_round_trips_responses() {
        let codec = JsonCodec;
        let resp = Response::Error(ReasonCode::NotYourTurn);
        let bytes = codec.encode(&resp).unwrap();
        let decoded: Response = codec.decode(&bytes).unwrap();
        assert_eq!(resp, decoded);
    }

    #[test]
    fn test_json_codec_decode_garbage_is_an_error() {
        let codec = JsonCodec;
        let result: Result<Response, _> = codec.decode(b"\xff\xfe");
        assert!(result.is_err());
    }
}
