//! Transport abstraction layer for clubgate.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the message channel a client talks to the gateway through.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// One outbound message.
///
/// JSON envelopes travel as [`Frame::Text`]; binary frames exist for codecs
/// that don't produce UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A UTF-8 text frame.
    Text(String),
    /// An opaque binary frame.
    Binary(Vec<u8>),
}

/// Accepts new incoming connections.
///
/// Accepting only takes the socket. The protocol handshake is a separate
/// step ([`Handshake::complete`]) so a caller can run it off the accept
/// loop, under its own deadline.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// An accepted socket that still has to complete its handshake.
    type Pending: Handshake<Connection = Self::Connection, Error = Self::Error>;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next incoming socket.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;
}

/// The second half of accepting a connection.
pub trait Handshake: Send + 'static {
    /// The connection produced once the handshake succeeds.
    type Connection: Connection;
    /// The error type for a failed handshake.
    type Error: std::error::Error + Send + Sync;

    /// Runs the handshake with the peer.
    ///
    /// Waits for as long as the peer takes; wrap it in a timeout.
    async fn complete(self) -> Result<Self::Connection, Self::Error>;
}

/// A single bidirectional message channel.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, frame: Frame) -> Result<(), Self::Error>;

    /// Receives the next message payload from the remote peer.
    ///
    /// Text and binary frames both arrive as bytes. Returns `Ok(None)` when
    /// the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
