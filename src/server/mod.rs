//! gRPC transport layer.

/// Server configuration and rate limiting.
pub mod config;

/// gRPC service implementation.
pub mod service;

pub use config::{RateLimiter, ServerConfig};
pub use service::AuthGrpc;
