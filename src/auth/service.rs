//! Auth core: orchestrates registration, login and admin checks.
//!
//! The service holds no mutable state; every method is a read-modify-return
//! pipeline over the injected capabilities. Concurrent logins need no
//! coordination, and duplicate concurrent registrations are serialized by the
//! store's uniqueness constraint, not here.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{password, token};
use crate::error::{AuthError, StorageError};
use crate::models::{App, User};

/// Persists new user records.
#[async_trait]
pub trait UserSaver: Send + Sync {
    /// Stores a new user, returning the assigned id. A duplicate email must
    /// surface as [`StorageError::AlreadyExists`].
    async fn save_user(&self, email: &str, pass_hash: &str) -> Result<i64, StorageError>;
}

/// Looks up user records by email.
#[async_trait]
pub trait UserProvider: Send + Sync {
    async fn user_by_email(&self, email: &str) -> Result<User, StorageError>;
}

/// Resolves client applications by id.
#[async_trait]
pub trait AppProvider: Send + Sync {
    async fn app(&self, app_id: i64) -> Result<App, StorageError>;
}

/// Answers role lookups for registered users.
#[async_trait]
pub trait RoleProvider: Send + Sync {
    async fn is_admin(&self, user_id: i64) -> Result<bool, StorageError>;
}

/// Core SSO service.
///
/// Generic over its collaborators so each depends only on the capability it
/// uses; in production all four are one storage handle.
pub struct Auth<S, P, A, R> {
    saver: S,
    users: P,
    apps: A,
    roles: R,
    token_ttl: Duration,
}

impl<S, P, A, R> Auth<S, P, A, R>
where
    S: UserSaver,
    P: UserProvider,
    A: AppProvider,
    R: RoleProvider,
{
    pub fn new(saver: S, users: P, apps: A, roles: R, token_ttl: Duration) -> Self {
        Self {
            saver,
            users,
            apps,
            roles,
            token_ttl,
        }
    }

    /// Registers a new user and returns the assigned id.
    ///
    /// The password is hashed with Argon2id before it reaches storage; a
    /// duplicate email yields [`AuthError::AlreadyExists`].
    pub async fn register(&self, email: &str, pass: &str) -> Result<i64, AuthError> {
        const OP: &str = "auth.register";

        info!(op = OP, email, "registering new user");

        let pass_hash = password::hash(pass)?;

        let id = self
            .saver
            .save_user(email, &pass_hash)
            .await
            .map_err(|e| match e {
                StorageError::AlreadyExists => {
                    warn!(op = OP, email, "email already registered");
                    AuthError::AlreadyExists
                }
                other => {
                    warn!(op = OP, email, error = %other, "failed to save user");
                    AuthError::internal(OP, other)
                }
            })?;

        info!(op = OP, email, user_id = id, "user registered");

        Ok(id)
    }

    /// Authenticates a user and returns a session token scoped to `app_id`.
    ///
    /// Unknown email and wrong password both yield the one
    /// [`AuthError::InvalidCredentials`] value; an unknown application is a
    /// distinct, operator-visible [`AuthError::AppNotFound`]. Performs no
    /// writes.
    pub async fn login(&self, email: &str, pass: &str, app_id: i64) -> Result<String, AuthError> {
        const OP: &str = "auth.login";

        info!(op = OP, email, app_id, "attempting login");

        let user = self
            .users
            .user_by_email(email)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => {
                    info!(op = OP, email, "user not found");
                    AuthError::InvalidCredentials
                }
                other => {
                    warn!(op = OP, email, error = %other, "failed to fetch user");
                    AuthError::internal(OP, other)
                }
            })?;

        if !password::verify(&user.pass_hash, pass) {
            info!(op = OP, email, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let app = self.apps.app(app_id).await.map_err(|e| match e {
            StorageError::NotFound => {
                warn!(op = OP, app_id, "unknown application");
                AuthError::AppNotFound
            }
            other => {
                warn!(op = OP, app_id, error = %other, "failed to fetch application");
                AuthError::internal(OP, other)
            }
        })?;

        let signed = token::issue(&user, &app, self.token_ttl)?;

        info!(op = OP, email, user_id = user.id, app_id, "user logged in");

        Ok(signed)
    }

    /// Reports whether `user_id` holds administrative privileges.
    pub async fn is_admin(&self, user_id: i64) -> Result<bool, AuthError> {
        const OP: &str = "auth.is_admin";

        let admin = self.roles.is_admin(user_id).await.map_err(|e| match e {
            StorageError::NotFound => {
                info!(op = OP, user_id, "user not found");
                AuthError::UserNotFound
            }
            other => {
                warn!(op = OP, user_id, error = %other, "failed role lookup");
                AuthError::internal(OP, other)
            }
        })?;

        info!(op = OP, user_id, admin, "admin check");

        Ok(admin)
    }
}
