//! The collaborator boundary.
//!
//! clubgate doesn't talk to the remote service itself. A collaborator does:
//! one value per logged-in (or anonymous) account session, built from
//! credentials, exposing the request headers it will present upstream.
//! Its operations are ordinary Rust methods that the gateway reaches
//! through a method registry.

use std::collections::HashMap;

use crate::{CallError, CredentialSet, CredentialValue, Credentials};

/// Header carrying the account's user id.
pub const USER_ID_HEADER: &str = "CH-UserID";

/// Header carrying the device id the session is bound to.
pub const DEVICE_ID_HEADER: &str = "CH-DeviceId";

/// Header carrying the auth token.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// A header map as presented by a collaborator.
///
/// Values keep their JSON type; a collaborator renders them as header text
/// with `to_string()` when it calls upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(HashMap<String, CredentialValue>);

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the credential headers for the supplied fields of
    /// `credentials`. Missing fields produce no header.
    pub fn from_credentials(credentials: &Credentials) -> Self {
        let mut headers = Self::new();
        let fields = [
            (USER_ID_HEADER, &credentials.user_id),
            (AUTHORIZATION_HEADER, &credentials.user_token),
            (DEVICE_ID_HEADER, &credentials.user_device),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                headers.insert(name, value.clone());
            }
        }
        headers
    }

    /// Sets a header, replacing any previous value.
    pub fn insert(&mut self, name: &str, value: impl Into<CredentialValue>) {
        self.0.insert(name.to_string(), value.into());
    }

    /// Returns a header value.
    pub fn get(&self, name: &str) -> Option<&CredentialValue> {
        self.0.get(name)
    }

    /// Returns a header value only if it is non-empty.
    pub fn get_present(&self, name: &str) -> Option<&CredentialValue> {
        self.get(name).filter(|value| !value.is_empty())
    }
}

/// A remote account session.
///
/// # Example
///
/// ```rust
/// use clubgate_session::{Collaborator, Credentials, Headers};
///
/// struct Club {
///     headers: Headers,
/// }
///
/// impl Collaborator for Club {
///     fn with_credentials(credentials: &Credentials) -> Self {
///         Club { headers: Headers::from_credentials(credentials) }
///     }
///
///     fn headers(&self) -> &Headers {
///         &self.headers
///     }
/// }
///
/// let club = Club::anonymous();
/// assert!(club.credentials().is_err());
/// ```
pub trait Collaborator: Sized + Send + Sync + 'static {
    /// Builds a session from credentials. Absent fields mean "not
    /// supplied"; construction itself never contacts the remote service.
    fn with_credentials(credentials: &Credentials) -> Self;

    /// Builds a session with no credentials at all.
    fn anonymous() -> Self {
        Self::with_credentials(&Credentials::default())
    }

    /// The headers this session presents upstream.
    fn headers(&self) -> &Headers;

    /// The credential set carried by [`headers`](Self::headers).
    ///
    /// # Errors
    /// [`CallError::NotAuthenticated`] if the user id, device id, or auth
    /// token header is missing.
    fn credentials(&self) -> Result<CredentialSet, CallError> {
        CredentialSet::from_headers(self.headers())
    }
}
