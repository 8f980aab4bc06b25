//! Error mapper: every request-level failure becomes exactly one fault kind.
//!
//! | Kind | Code | Client sees |
//! |---|---|---|
//! | `InvalidEnvelope` | -32602 | "Invalid rpc 2.0 structure" |
//! | `MethodNotFound` | -32601 | "Method not found" |
//! | `InvalidArguments` | -1 | the failure's own text |
//! | `NotAuthenticated` | -32600 | "Not Authenticated" |
//! | `Internal` | -32000 | "Internal server error" |
//!
//! The payload of each variant is for the server log. Only
//! `InvalidArguments` forwards its text to the client.

use clubgate_protocol::{codes, ErrorObject, ProtocolError};
use clubgate_session::CallError;

/// Wire message for [`Fault::InvalidEnvelope`].
pub const INVALID_ENVELOPE_MESSAGE: &str = "Invalid rpc 2.0 structure";
/// Wire message for [`Fault::MethodNotFound`].
pub const METHOD_NOT_FOUND_MESSAGE: &str = "Method not found";
/// Wire message for [`Fault::NotAuthenticated`].
pub const NOT_AUTHENTICATED_MESSAGE: &str = "Not Authenticated";
/// Wire message for [`Fault::Internal`].
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// A classified request failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// The frame isn't a complete request envelope.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// No operation by this name.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// The operation exists but the arguments don't fit.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The session lacks valid credentials. Reported faults of this kind
    /// also reset the session to anonymous.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Fault {
    /// The wire error code.
    pub fn code(&self) -> i64 {
        match self {
            Fault::InvalidEnvelope(_) => codes::INVALID_ENVELOPE,
            Fault::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            Fault::InvalidArguments(_) => codes::INVALID_ARGUMENTS,
            Fault::NotAuthenticated(_) => codes::NOT_AUTHENTICATED,
            Fault::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// The text the client sees.
    pub fn message(&self) -> &str {
        match self {
            Fault::InvalidEnvelope(_) => INVALID_ENVELOPE_MESSAGE,
            Fault::MethodNotFound(_) => METHOD_NOT_FOUND_MESSAGE,
            Fault::InvalidArguments(text) => text,
            Fault::NotAuthenticated(_) => NOT_AUTHENTICATED_MESSAGE,
            Fault::Internal(_) => INTERNAL_ERROR_MESSAGE,
        }
    }

    /// Returns `true` if reporting this fault logs the session out.
    pub fn resets_session(&self) -> bool {
        matches!(self, Fault::NotAuthenticated(_))
    }

    /// The `error` member of the reply.
    pub fn to_error_object(&self) -> ErrorObject {
        ErrorObject {
            message: self.message().to_string(),
            code: self.code(),
        }
    }
}

impl From<CallError> for Fault {
    fn from(err: CallError) -> Self {
        match err {
            CallError::UnknownOperation(name) => Fault::MethodNotFound(name),
            CallError::BadArguments(text) => Fault::InvalidArguments(text),
            CallError::NotAuthenticated(reason) => {
                Fault::NotAuthenticated(reason)
            }
            CallError::Remote(detail) => Fault::Internal(detail),
        }
    }
}

impl From<ProtocolError> for Fault {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Encode(e) => Fault::Internal(e.to_string()),
            other => Fault::InvalidEnvelope(other.to_string()),
        }
    }
}
