//! # Clubgate
//!
//! A per-connection JSON-RPC gateway over WebSocket.
//!
//! Each client connection owns one remote-service session (a
//! [`Collaborator`]). Clients call operations on it by name with positional
//! arguments, swap it by authenticating, and get an extra `"auth"` push when
//! a phone login hands out fresh credentials. Collaborator calls block, so
//! they run on Tokio's blocking pool while the connection task waits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use clubgate::prelude::*;
//!
//! struct Club { headers: Headers }
//!
//! impl Collaborator for Club {
//!     fn with_credentials(credentials: &Credentials) -> Self {
//!         Club { headers: Headers::from_credentials(credentials) }
//!     }
//!     fn headers(&self) -> &Headers { &self.headers }
//! }
//!
//! # async fn start() -> Result<(), GatewayError> {
//! let registry = MethodRegistry::new()
//!     .with("me", |club: &Club, (): ()| club.credentials());
//!
//! let server = GatewayServerBuilder::new()
//!     .bind("0.0.0.0:8080")
//!     .build::<Club>(registry)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod connection;
pub mod dispatch;
mod error;
pub mod fault;
pub mod registry;
mod server;

pub use config::{GatewayConfig, ADDR_VAR, IDLE_TIMEOUT_VAR, PATH_VAR};
pub use dispatch::Dispatcher;
pub use error::GatewayError;
pub use fault::Fault;
pub use registry::{FromParams, MethodRegistry, Operation};
pub use server::{GatewayServer, GatewayServerBuilder, HANDSHAKE_TIMEOUT};

pub use clubgate_protocol::{
    codes, Codec, ErrorObject, JsonCodec, ProtocolError, RpcRequest,
    RpcResponse, AUTH_RESPONSE_ID,
};
pub use clubgate_session::{
    AuthState, CallError, Collaborator, CredentialSet, CredentialValue,
    Credentials, Headers, AUTHORIZATION_HEADER, DEVICE_ID_HEADER, USER_ID_HEADER,
};
pub use clubgate_transport::TransportError;

/// Everything needed to define a collaborator and run a gateway.
pub mod prelude {
    pub use crate::{
        CallError, Collaborator, CredentialSet, CredentialValue, Credentials,
        GatewayConfig, GatewayError, GatewayServer, GatewayServerBuilder,
        Headers, MethodRegistry, DEVICE_ID_HEADER,
    };
}
