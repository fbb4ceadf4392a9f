use std::fmt;

/// Identity record persisted by the credential store.
///
/// Immutable after creation; the admin flag lives in storage and is exposed
/// only through the role-lookup capability.
#[derive(Clone)]
pub struct User {
    /// Unique identifier assigned by the store at creation.
    pub id: i64,
    /// Unique email, used as the lookup key.
    pub email: String,
    /// PHC-formatted password hash. Opaque; verified only via the hashing
    /// module, never compared by equality.
    pub pass_hash: String,
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("pass_hash", &"<redacted>")
            .finish()
    }
}

/// Registered client application of the SSO system.
///
/// Read-only from the auth core's perspective; rows are administered by
/// external tooling.
#[derive(Clone)]
pub struct App {
    /// Unique identifier.
    pub id: i64,
    /// Human-readable application name.
    pub name: String,
    /// Symmetric secret used exclusively to sign this application's tokens.
    pub secret: String,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}
