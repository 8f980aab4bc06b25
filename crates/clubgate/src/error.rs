//! Unified error type for the clubgate server.

use clubgate_protocol::ProtocolError;
use clubgate_transport::TransportError;

/// Top-level error for everything outside a single request.
///
/// Request-level failures never show up here; they are answered on the
/// wire as a [`Fault`](crate::Fault). This covers binding, config, and a
/// connection that can no longer be written to.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A reply could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An invalid configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}
