//! Error types for collaborator calls.

/// How a collaborator operation (or collaborator construction) failed.
///
/// This is the whole failure vocabulary of the collaborator boundary. The
/// gateway maps each variant onto one wire error code; nothing else about
/// a failure reaches the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// The collaborator has no operation by this name.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// The arguments don't fit the operation. The text is shown to the
    /// client verbatim.
    #[error("{0}")]
    BadArguments(String),

    /// The session lacks the credentials the operation needs.
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    /// The remote service failed in some other way.
    #[error("remote call failed: {0}")]
    Remote(String),
}
