//! Request and response envelopes.
//!
//! Inbound:
//!
//! ```text
//! { "id": <any>, "method": <string>, "params": [ <args...> ], "jsonrpc": <any> }
//! ```
//!
//! Outbound:
//!
//! ```text
//! { "id": <any | "auth">, "result": <any | null>, "error": { "message", "code" } | null }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Codec, ProtocolError};

/// Reserved id for authentication results and re-authentication pushes.
pub const AUTH_RESPONSE_ID: &str = "auth";

// ---------------------------------------------------------------------------
// RpcRequest
// ---------------------------------------------------------------------------

/// A validated inbound request.
///
/// All four fields are required. The `jsonrpc` marker only has to exist;
/// its value is never checked.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    /// Correlation token echoed back in the reply. Any JSON value.
    pub id: Value,
    /// Name of the operation to run.
    pub method: String,
    /// Positional arguments.
    pub params: Vec<Value>,
    /// Version marker, kept as sent.
    pub jsonrpc: Value,
}

impl RpcRequest {
    /// Decodes and validates a raw frame payload.
    ///
    /// # Errors
    /// - [`ProtocolError::Decode`] if the payload isn't JSON.
    /// - [`ProtocolError::InvalidEnvelope`] if it is JSON but breaks the
    ///   envelope rules.
    pub fn decode(
        codec: &impl Codec,
        data: &[u8],
    ) -> Result<Self, ProtocolError> {
        let value: Value = codec.decode(data)?;
        Self::from_value(value)
    }

    /// Validates an already-parsed JSON value as a request envelope.
    ///
    /// `method` must be a string and `params` an array. When validation
    /// fails the error carries the inbound `id` if there was one.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut fields) = value else {
            return Err(ProtocolError::InvalidEnvelope {
                id: Value::from(0),
                reason: "not a JSON object",
            });
        };

        let id = fields.remove("id");
        let reply_id = id.clone().unwrap_or_else(|| Value::from(0));
        let invalid = |reason| ProtocolError::InvalidEnvelope {
            id: reply_id.clone(),
            reason,
        };

        let id = id.ok_or_else(|| invalid("missing id"))?;
        let method = match fields.remove("method") {
            Some(Value::String(method)) => method,
            Some(_) => return Err(invalid("method is not a string")),
            None => return Err(invalid("missing method")),
        };
        let params = match fields.remove("params") {
            Some(Value::Array(params)) => params,
            Some(_) => return Err(invalid("params is not an array")),
            None => return Err(invalid("missing params")),
        };
        let jsonrpc =
            fields.remove("jsonrpc").ok_or_else(|| invalid("missing jsonrpc"))?;

        Ok(Self {
            id,
            method,
            params,
            jsonrpc,
        })
    }
}

// ---------------------------------------------------------------------------
// RpcResponse
// ---------------------------------------------------------------------------

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Human-readable text. Never carries internal details.
    pub message: String,
    /// One of the constants in [`codes`](crate::codes).
    pub code: i64,
}

/// An outbound envelope.
///
/// Both `result` and `error` are always serialized. A failure has
/// `result: null`; a success has `error: null` and a `result` that may
/// itself be null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    /// The request id, `"auth"`, or `0`.
    pub id: Value,
    /// Operation result; `null` on failure.
    #[serde(default)]
    pub result: Value,
    /// Failure description; `None` (serialized as `null`) on success.
    pub error: Option<ErrorObject>,
}

impl RpcResponse {
    /// A successful reply to request `id`.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            result,
            error: None,
        }
    }

    /// A failed reply to request `id`.
    pub fn failure(id: Value, error: ErrorObject) -> Self {
        Self {
            id,
            result: Value::Null,
            error: Some(error),
        }
    }

    /// An authentication result or push, tagged with [`AUTH_RESPONSE_ID`].
    pub fn auth(result: Value) -> Self {
        Self::success(Value::from(AUTH_RESPONSE_ID), result)
    }

    /// Returns `true` if this is a failure reply.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// =========================================================================
// Tests
// =========================================================================
