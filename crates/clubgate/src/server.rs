//! `GatewayServer` builder and accept loop.
//!
//! This is the entry point for running a gateway. It ties the layers
//! together: transport → protocol → dispatcher → collaborator.

use std::sync::Arc;
use std::time::Duration;

use clubgate_protocol::{Codec, JsonCodec};
use clubgate_session::Collaborator;
use clubgate_transport::{Handshake, Transport, WebSocketTransport};

use crate::connection::handle_connection;
use crate::{Dispatcher, GatewayConfig, GatewayError, MethodRegistry};

/// How long a new socket gets to finish its WebSocket upgrade.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared server state passed to each connection task.
///
/// Read-only after startup, so it is shared through an `Arc` without any
/// lock.
pub(crate) struct ServerState<C: Collaborator, K: Codec> {
    pub(crate) dispatcher: Dispatcher<C, K>,
    pub(crate) config: GatewayConfig,
}

/// Builder for configuring and starting a gateway.
///
/// # Example
///
/// ```rust,ignore
/// use clubgate::prelude::*;
///
/// let server = GatewayServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .path("/ws")
///     .build::<MyClub>(registry)
///     .await?;
/// server.run().await
/// ```
pub struct GatewayServerBuilder {
    config: GatewayConfig,
}

impl GatewayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: GatewayConfig::default(),
        }
    }

    /// Replaces all settings with `config`.
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the path WebSocket upgrades are accepted on.
    pub fn path(mut self, path: &str) -> Self {
        self.config.path = path.to_string();
        self
    }

    /// Closes connections that stay quiet for `timeout`.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = Some(timeout);
        self
    }

    /// Binds the listener and builds the server around `registry`.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    ///
    /// # Errors
    /// [`GatewayError::Config`] for an invalid path, or a transport error
    /// if the address can't be bound.
    pub async fn build<C: Collaborator>(
        self,
        registry: MethodRegistry<C>,
    ) -> Result<GatewayServer<C, JsonCodec>, GatewayError> {
        self.config.validate()?;
        let transport =
            WebSocketTransport::bind(&self.config.bind_addr, &self.config.path)
                .await?;

        tracing::debug!(methods = ?registry.methods(), "registered operations");
        let state = Arc::new(ServerState {
            dispatcher: Dispatcher::new(registry, JsonCodec),
            config: self.config,
        });

        Ok(GatewayServer { transport, state })
    }
}

impl Default for GatewayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound gateway.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct GatewayServer<C: Collaborator, K: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C, K>>,
}

impl<C, K> GatewayServer<C, K>
where
    C: Collaborator,
    K: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The active configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }

    /// Runs the accept loop.
    ///
    /// Spawns a task per accepted socket. The WebSocket upgrade runs in
    /// that task under [`HANDSHAKE_TIMEOUT`], so a peer that never finishes
    /// it holds up nobody else. Runs until the future is dropped or the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), GatewayError> {
        tracing::info!(path = %self.state.config.path, "clubgate server running");

        loop {
            let pending = match self.transport.accept().await {
                Ok(pending) => pending,
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                    continue;
                }
            };

            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let addr = pending.peer_addr();
                let conn = match tokio::time::timeout(
                    HANDSHAKE_TIMEOUT,
                    pending.complete(),
                )
                .await
                {
                    Ok(Ok(conn)) => conn,
                    Ok(Err(e)) => {
                        tracing::debug!(%addr, error = %e, "handshake rejected");
                        return;
                    }
                    Err(_) => {
                        tracing::debug!(%addr, "handshake timed out");
                        return;
                    }
                };

                if let Err(e) = handle_connection::<C, K>(conn, state).await {
                    tracing::debug!(error = %e, "connection ended with error");
                }
            });
        }
    }
}
