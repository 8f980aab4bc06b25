//! Codec trait and implementations for serializing/deserializing envelopes.
//!
//! A codec converts between Rust types and transport frames. The gateway
//! only needs something that implements [`Codec`]; [`JsonCodec`] is what
//! clients speak today.

use clubgate_transport::Frame;
use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode values into frames and decode payloads back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into an outbound frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Frame, ProtocolError>;

    /// Deserializes an inbound payload.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`) and emits text frames.
///
/// ## Example
///
/// ```rust
/// use clubgate_protocol::{Codec, JsonCodec, RpcResponse};
/// use clubgate_transport::Frame;
///
/// let codec = JsonCodec;
/// let frame = codec.encode(&RpcResponse::success(1.into(), "pong".into())).unwrap();
/// assert_eq!(
///     frame,
///     Frame::Text(r#"{"id":1,"result":"pong","error":null}"#.to_string())
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Frame, ProtocolError> {
        serde_json::to_string(value)
            .map(Frame::Text)
            .map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn test_json_codec_encodes_text_frames() {
        let frame = JsonCodec.encode(&json!({"a": 1})).unwrap();
        assert_eq!(frame, Frame::Text(r#"{"a":1}"#.to_string()));
    }

    #[test]
    fn test_json_codec_decode_garbage_returns_decode_error() {
        let result: Result<Value, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}
