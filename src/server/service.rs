use tonic::{Request, Response, Status};

use super::config::RateLimiter;
use crate::auth::{AppProvider, Auth, RoleProvider, UserProvider, UserSaver};
use crate::error::AuthError;
use crate::proto::auth_server::Auth as AuthRpc;
use crate::proto::{
    IsAdminRequest, IsAdminResponse, LoginRequest, LoginResponse, RegisterRequest,
    RegisterResponse,
};

/// gRPC adapter over the auth core.
///
/// Validates request fields, applies the rate limit, and maps domain errors
/// to gRPC statuses. All decision logic lives in [`Auth`].
pub struct AuthGrpc<S, P, A, R> {
    auth: Auth<S, P, A, R>,
    rate_limiter: RateLimiter,
}

impl<S, P, A, R> AuthGrpc<S, P, A, R> {
    /// Creates a new transport adapter around the auth core.
    pub fn new(auth: Auth<S, P, A, R>, rate_limiter: RateLimiter) -> Self {
        Self { auth, rate_limiter }
    }
}

#[allow(clippy::result_large_err)]
fn validate_email(email: &str) -> Result<(), Status> {
    if email.is_empty() {
        return Err(Status::invalid_argument("email is required"));
    }

    if email.len() > 254 {
        return Err(Status::invalid_argument("email too long"));
    }

    if !email.contains('@') {
        return Err(Status::invalid_argument("email is malformed"));
    }

    Ok(())
}

#[allow(clippy::result_large_err)]
fn validate_password(password: &str) -> Result<(), Status> {
    if password.is_empty() {
        return Err(Status::invalid_argument("password is required"));
    }

    if password.len() > 512 {
        return Err(Status::invalid_argument("password too long"));
    }

    Ok(())
}

/// Maps a domain error onto the wire status.
///
/// Internal details never cross the wire; the core has already logged them
/// with full context at the point of detection.
fn into_status(err: AuthError) -> Status {
    match err {
        AuthError::InvalidCredentials => Status::unauthenticated("invalid credentials"),
        AuthError::AlreadyExists => Status::already_exists("user already exists"),
        AuthError::AppNotFound => Status::not_found("application not found"),
        AuthError::UserNotFound => Status::not_found("user not found"),
        AuthError::Internal { .. } => Status::internal("internal error"),
    }
}

#[tonic::async_trait]
impl<S, P, A, R> AuthRpc for AuthGrpc<S, P, A, R>
where
    S: UserSaver + 'static,
    P: UserProvider + 'static,
    A: AppProvider + 'static,
    R: RoleProvider + 'static,
{
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        self.rate_limiter.check_rate_limit().await?;

        let req = request.into_inner();

        validate_email(&req.email)?;
        validate_password(&req.password)?;

        let user_id = self
            .auth
            .register(&req.email, &req.password)
            .await
            .map_err(into_status)?;

        Ok(Response::new(RegisterResponse { user_id }))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<LoginResponse>, Status> {
        self.rate_limiter.check_rate_limit().await?;

        let req = request.into_inner();

        validate_email(&req.email)?;
        validate_password(&req.password)?;

        if req.app_id <= 0 {
            return Err(Status::invalid_argument("app_id is required"));
        }

        let token = self
            .auth
            .login(&req.email, &req.password, req.app_id)
            .await
            .map_err(into_status)?;

        Ok(Response::new(LoginResponse { token }))
    }

    async fn is_admin(
        &self,
        request: Request<IsAdminRequest>,
    ) -> Result<Response<IsAdminResponse>, Status> {
        self.rate_limiter.check_rate_limit().await?;

        let req = request.into_inner();

        if req.user_id <= 0 {
            return Err(Status::invalid_argument("user_id is required"));
        }

        let is_admin = self.auth.is_admin(req.user_id).await.map_err(into_status)?;

        Ok(Response::new(IsAdminResponse { is_admin }))
    }
}
