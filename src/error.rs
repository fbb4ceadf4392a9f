//! Error types for the SSO service.

/// Failures surfaced by the persistence capabilities.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No record matched the lookup key.
    #[error("record not found")]
    NotFound,

    /// A uniqueness constraint rejected the write.
    #[error("record already exists")]
    AlreadyExists,

    /// The underlying database failed.
    #[error("database failure: {0}")]
    Database(#[from] sqlx::Error),
}

/// Failures surfaced by the auth core.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email or wrong password during login. Deliberately a single
    /// variant with a single message so callers cannot distinguish the two
    /// cases and enumerate accounts.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// A user with this email is already registered.
    #[error("user already exists")]
    AlreadyExists,

    /// The requested client application is not registered.
    #[error("application not found")]
    AppNotFound,

    /// No user with the given id exists.
    #[error("user not found")]
    UserNotFound,

    /// Unexpected failure from hashing, signing or storage, tagged with the
    /// operation that produced it.
    #[error("{op}: {source}")]
    Internal {
        /// Operation tag, e.g. `auth.login`.
        op: &'static str,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AuthError {
    /// Wraps an unexpected failure with the operation that produced it.
    pub fn internal(
        op: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Internal {
            op,
            source: source.into(),
        }
    }
}
