//! Error types for the protocol layer.
//!
//! Each clubgate crate defines its own error enum. A `ProtocolError` always
//! means the problem is in the shape or encoding of a message, never in the
//! network or in the collaborator.

use serde_json::Value;

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an envelope into a frame).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The frame isn't valid JSON at all.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The frame is JSON but not a usable request envelope.
    ///
    /// `id` is what the reply should echo: the inbound `id` when the
    /// message had one, otherwise `0`.
    #[error("invalid envelope: {reason}")]
    InvalidEnvelope {
        /// Correlation id for the error reply.
        id: Value,
        /// Which rule the envelope broke.
        reason: &'static str,
    },
}

impl ProtocolError {
    /// The id an error reply to this failure should carry.
    pub fn response_id(&self) -> Value {
        match self {
            ProtocolError::InvalidEnvelope { id, .. } => id.clone(),
            _ => Value::from(0),
        }
    }
}
