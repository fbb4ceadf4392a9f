//! Session token issuance.
//!
//! A session token is a stateless HS256 JWT binding a user to one client
//! application, signed with that application's secret. Nothing is persisted
//! server-side; the token is the whole session.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::models::{App, User};

const OP: &str = "auth.token.issue";

/// Claims carried by an issued session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id.
    pub uid: i64,
    /// Application the token is scoped to.
    pub app_id: i64,
    /// Email of the subject user.
    pub email: String,
    /// Expiry, seconds since the UNIX epoch.
    pub exp: i64,
}

/// Builds and signs a session token for `user` scoped to `app`, valid for
/// `ttl` from now.
///
/// Fails only if the clock is unusable or signing fails (malformed key
/// material); both surface as op-tagged internal errors.
pub fn issue(user: &User, app: &App, ttl: Duration) -> Result<String, AuthError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AuthError::internal(OP, e.to_string()))?;
    let exp = i64::try_from((now + ttl).as_secs()).unwrap_or(i64::MAX);

    let claims = Claims {
        uid: user.id,
        app_id: app.id,
        email: user.email.clone(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(app.secret.as_bytes()),
    )
    .map_err(|e| AuthError::internal(OP, e))
}
