//! Single-sign-on authentication service exposed over gRPC.
//!
//! Users register with an email/password pair, authenticate to receive a
//! signed session token scoped to one client application, and can be checked
//! for administrative privileges. Tokens are stateless JWTs signed with the
//! client application's secret; nothing is stored server-side per session.

/// Core authentication logic: registration, login and role checks.
pub mod auth;
/// Error types for the service and its storage boundary.
pub mod error;
/// Domain models shared across modules.
pub mod models;
/// gRPC transport layer: configuration, rate limiting and the service adapter.
pub mod server;
/// Persistence implementations for the capability traits.
pub mod storage;

/// Generated protobuf/gRPC bindings.
pub mod proto {
    tonic::include_proto!("sso.v1");
}

pub use error::{AuthError, StorageError};
pub use models::{App, User};
