//! Wire error codes.
//!
//! Every failure the gateway reports maps to exactly one of these. Clients
//! switch on the number, so the values never change.

/// A required envelope field is missing or the frame isn't an envelope.
pub const INVALID_ENVELOPE: i64 = -32602;

/// The requested operation doesn't exist.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// The operation exists but the arguments don't fit it.
pub const INVALID_ARGUMENTS: i64 = -1;

/// The session lacks valid credentials.
pub const NOT_AUTHENTICATED: i64 = -32600;

/// Anything else. Details stay in the server log.
pub const INTERNAL_ERROR: i64 = -32000;
