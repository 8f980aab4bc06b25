//! The auth state manager: one connection's collaborator reference.
//!
//! A connection always holds exactly one collaborator. It starts anonymous
//! and is replaced wholesale on every auth event:
//!
//! ```text
//!             authenticate() / reauthenticate()
//!   anonymous ────────────────────────────────→ authenticated
//!       ↑                                             │
//!       └──────────────── logout() ───────────────────┘
//! ```
//!
//! Replacement swaps an `Arc`. A blocking call that already holds the old
//! `Arc` finishes against the old session; everything dispatched afterwards
//! sees the new one. Nothing is ever mutated in place.
//!
//! # Concurrency note
//!
//! `AuthState` is owned by the connection task and passed by `&mut` through
//! dispatch. It is never shared between connections, so it needs no lock.

use std::sync::Arc;

use crate::{CallError, Collaborator, CredentialSet, Credentials};

/// Holds the current collaborator of one connection.
pub struct AuthState<C: Collaborator> {
    current: Arc<C>,
}

impl<C: Collaborator> AuthState<C> {
    /// Starts with a fresh anonymous collaborator.
    pub fn anonymous() -> Self {
        Self {
            current: Arc::new(C::anonymous()),
        }
    }

    /// Returns a handle to the current collaborator.
    ///
    /// The handle stays valid after a later swap; it just stops being
    /// current.
    pub fn current(&self) -> Arc<C> {
        Arc::clone(&self.current)
    }

    /// Replaces the current collaborator.
    pub fn install(&mut self, collaborator: C) {
        self.current = Arc::new(collaborator);
    }

    /// Builds a collaborator from `credentials` and installs it if it
    /// carries a complete credential set.
    ///
    /// On failure the current collaborator is left alone; callers reset it
    /// through [`logout`](Self::logout) when reporting the fault.
    ///
    /// # Errors
    /// [`CallError::NotAuthenticated`] if the new collaborator lacks the
    /// user id, device id, or auth token.
    pub fn authenticate(
        &mut self,
        credentials: &Credentials,
    ) -> Result<CredentialSet, CallError> {
        let candidate = C::with_credentials(credentials);
        let set = candidate.credentials()?;
        self.install(candidate);
        tracing::info!(user_id = %set.user_id, "updated credentials");
        Ok(set)
    }

    /// Installs a collaborator built from a known-complete credential set,
    /// as issued by the remote service after a phone login.
    pub fn reauthenticate(&mut self, set: &CredentialSet) {
        self.install(C::with_credentials(&Credentials::from(set.clone())));
        tracing::info!(user_id = %set.user_id, "updated credentials after login");
    }

    /// Drops the current session and starts over anonymously.
    pub fn logout(&mut self) {
        self.install(C::anonymous());
        tracing::debug!("session reset to anonymous");
    }

    /// The credential set of the current collaborator, if it has one.
    pub fn credentials(&self) -> Option<CredentialSet> {
        self.current.credentials().ok()
    }

    /// Returns `true` if the current collaborator carries full credentials.
    pub fn is_authenticated(&self) -> bool {
        self.credentials().is_some()
    }
}

impl<C: Collaborator> Default for AuthState<C> {
    fn default() -> Self {
        Self::anonymous()
    }
}

// =========================================================================
// Tests
// =========================================================================
