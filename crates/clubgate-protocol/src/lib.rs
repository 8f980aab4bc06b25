//! Wire protocol for clubgate.
//!
//! This crate defines what a client and the gateway say to each other:
//!
//! - **Types** ([`RpcRequest`], [`RpcResponse`], [`ErrorObject`]) — the
//!   envelopes that travel on the wire.
//! - **Codes** ([`codes`]) — the closed set of wire error codes.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how envelopes are turned
//!   into frames and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while decoding or
//!   encoding.
//!
//! # Architecture
//!
//! ```text
//! Transport (frames) → Protocol (RpcRequest / RpcResponse) → Dispatch (collaborator calls)
//! ```
//!
//! The protocol layer knows nothing about collaborators or credentials. It
//! only knows which fields an envelope must carry.

mod codec;
pub mod codes;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{ErrorObject, RpcRequest, RpcResponse, AUTH_RESPONSE_ID};
