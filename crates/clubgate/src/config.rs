//! Gateway configuration.

use std::time::Duration;

use crate::GatewayError;

/// Environment variable for the listen address.
pub const ADDR_VAR: &str = "CLUBGATE_ADDR";
/// Environment variable for the WebSocket path.
pub const PATH_VAR: &str = "CLUBGATE_PATH";
/// Environment variable for the idle timeout in seconds; `0` disables it.
pub const IDLE_TIMEOUT_VAR: &str = "CLUBGATE_IDLE_TIMEOUT_SECS";

/// Where the gateway listens and how long it waits on quiet clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Address the listener binds to (`host:port`).
    pub bind_addr: String,
    /// The one path WebSocket upgrades are accepted on.
    pub path: String,
    /// Close a connection after this long without an inbound frame.
    /// `None` waits forever.
    pub idle_timeout: Option<Duration>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            path: "/ws".to_string(),
            idle_timeout: None,
        }
    }
}

impl GatewayConfig {
    /// Reads the configuration from the process environment, falling back
    /// to the defaults for unset variables.
    ///
    /// # Errors
    /// [`GatewayError::Config`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`from_env`](Self::from_env), with variables supplied by
    /// `lookup`.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, GatewayError> {
        let mut config = Self::default();

        if let Some(addr) = lookup(ADDR_VAR) {
            if addr.trim().is_empty() {
                return Err(GatewayError::Config(format!(
                    "{ADDR_VAR} is empty"
                )));
            }
            config.bind_addr = addr;
        }

        if let Some(path) = lookup(PATH_VAR) {
            config.path = path;
        }

        if let Some(secs) = lookup(IDLE_TIMEOUT_VAR) {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                GatewayError::Config(format!(
                    "{IDLE_TIMEOUT_VAR}={secs:?}: {e}"
                ))
            })?;
            config.idle_timeout =
                (secs > 0).then(|| Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks values the listener can't work with.
    ///
    /// # Errors
    /// [`GatewayError::Config`] if the path doesn't start with `/`.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if !self.path.starts_with('/') {
            return Err(GatewayError::Config(format!(
                "path must start with '/', got {:?}",
                self.path
            )));
        }
        Ok(())
    }
}
