//! Per-connection session state for clubgate.
//!
//! This crate owns everything the gateway knows about "who is logged in"
//! on a connection:
//!
//! 1. **The collaborator boundary** — the [`Collaborator`] trait the remote
//!    account client implements, and the [`Headers`] it exposes.
//! 2. **Credentials** — [`Credentials`] going in, [`CredentialSet`] coming
//!    back out.
//! 3. **Auth state** — [`AuthState`], the single collaborator reference a
//!    connection holds and swaps on login, re-login, and logout.
//!
//! # How it fits in the stack
//!
//! ```text
//! Dispatch (above)  ← asks for the current collaborator, reports auth faults
//!     ↕
//! Session (this crate)  ← owns and replaces the collaborator
//!     ↕
//! Collaborator (external)  ← talks to the remote service
//! ```

mod collaborator;
mod credentials;
mod error;
mod manager;

pub use collaborator::{
    Collaborator, Headers, AUTHORIZATION_HEADER, DEVICE_ID_HEADER,
    USER_ID_HEADER,
};
pub use credentials::{CredentialSet, CredentialValue, Credentials};
pub use error::CallError;
pub use manager::AuthState;
