//! Unified error type for the TinyRPG server.

use tinyrpg_protocol::ProtocolError;
use tinyrpg_transport::TransportError;

/// Top-level error that wraps the layer-specific errors.
///
/// Session rejections never appear here: the state machine hands those
/// back as values and the router turns them into `ERROR` responses. A
/// `ServerError` always means the *connection* is done — a transport
/// fault, an encode failure, or a failed handshake.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The opening handshake failed; the connection was rejected before a
    /// slot was allocated.
    #[error("handshake failed: {0}")]
    Handshake(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::MessageTooLong(16);
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Transport(_)));
        assert!(server_err.to_string().contains("16"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = serde_json::from_str::<tinyrpg_protocol::Request>("{}")
            .map_err(ProtocolError::Decode)
            .unwrap_err();
        let server_err: ServerError = err.into();
        assert!(matches!(server_err, ServerError::Protocol(_)));
    }

    #[test]
    fn test_handshake_error_display() {
        let err = ServerError::Handshake("unexpected client greeting".into());
        assert!(err.to_string().contains("unexpected client greeting"));
    }
}
