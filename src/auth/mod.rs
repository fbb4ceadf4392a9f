//! Registration, login and role-check orchestration.
//!
//! The core is polymorphic over four capability traits so that tests can
//! substitute in-memory collaborators and the transport never depends on a
//! concrete store.

/// Password hashing and verification.
pub mod password;
/// Auth core and its capability traits.
pub mod service;
/// Session token issuance.
pub mod token;

pub use service::{AppProvider, Auth, RoleProvider, UserProvider, UserSaver};
pub use token::Claims;
