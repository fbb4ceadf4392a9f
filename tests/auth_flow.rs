//! End-to-end tests over a real gRPC server backed by a scratch SQLite file.

mod common;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use sso_grpc::auth::{Auth, Claims};
use sso_grpc::proto::auth_client::AuthClient;
use sso_grpc::proto::auth_server::AuthServer;
use sso_grpc::proto::{IsAdminRequest, LoginRequest, RegisterRequest};
use sso_grpc::server::{AuthGrpc, RateLimiter};
use sso_grpc::storage::SqliteStorage;
use tempfile::TempDir;
use tonic::transport::Server;
use tonic::{Code, Request};

const APP_ID: i64 = 1;
const APP_SECRET: &str = "test-app-secret";
const OTHER_APP_ID: i64 = 2;
const OTHER_APP_SECRET: &str = "other-app-secret";
const TOKEN_TTL: Duration = Duration::from_secs(3600);

struct TestServer {
    url: String,
    storage: SqliteStorage,
    _dir: TempDir,
}

async fn start_test_server() -> TestServer {
    common::init_tracing();

    let dir = tempfile::tempdir().expect("tempdir");
    let storage = SqliteStorage::open(dir.path().join("sso.db"))
        .await
        .expect("open storage");
    storage
        .save_app(APP_ID, "test", APP_SECRET)
        .await
        .expect("seed app");
    storage
        .save_app(OTHER_APP_ID, "other", OTHER_APP_SECRET)
        .await
        .expect("seed other app");

    let auth = Auth::new(
        storage.clone(),
        storage.clone(),
        storage.clone(),
        storage.clone(),
        TOKEN_TTL,
    );
    let service = AuthGrpc::new(auth, RateLimiter::new(600_000, 10_000));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let local_addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        Server::builder()
            .add_service(AuthServer::new(service))
            .serve_with_incoming(tokio_stream::wrappers::TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    TestServer {
        url: format!("http://{local_addr}"),
        storage,
        _dir: dir,
    }
}

async fn register(
    client: &mut AuthClient<tonic::transport::Channel>,
    email: &str,
    password: &str,
) -> Result<i64, tonic::Status> {
    client
        .register(Request::new(RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
        }))
        .await
        .map(|r| r.into_inner().user_id)
}

async fn login(
    client: &mut AuthClient<tonic::transport::Channel>,
    email: &str,
    password: &str,
    app_id: i64,
) -> Result<String, tonic::Status> {
    client
        .login(Request::new(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            app_id,
        }))
        .await
        .map(|r| r.into_inner().token)
}

fn decode_claims(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
}

#[tokio::test]
async fn register_then_login_roundtrip() {
    let server = start_test_server().await;
    let mut client = AuthClient::connect(server.url.clone()).await.unwrap();

    let issued_not_before = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let uid = register(&mut client, "alice@example.com", "pa55word")
        .await
        .expect("registration should succeed");

    let token = login(&mut client, "alice@example.com", "pa55word", APP_ID)
        .await
        .expect("login should succeed");

    let claims = decode_claims(&token, APP_SECRET).expect("token decodes under issuing secret");
    assert_eq!(claims.uid, uid);
    assert_eq!(claims.app_id, APP_ID);
    assert_eq!(claims.email, "alice@example.com");

    // Expiry lands within the TTL window, modulo scheduling jitter.
    assert!(claims.exp >= issued_not_before + 3600);
    assert!(claims.exp <= issued_not_before + 3600 + 10);
}

#[tokio::test]
async fn token_is_scoped_to_the_issuing_application() {
    let server = start_test_server().await;
    let mut client = AuthClient::connect(server.url.clone()).await.unwrap();

    register(&mut client, "frank@example.com", "pw").await.unwrap();

    let token = login(&mut client, "frank@example.com", "pw", APP_ID)
        .await
        .unwrap();

    assert!(decode_claims(&token, APP_SECRET).is_ok());
    assert!(decode_claims(&token, OTHER_APP_SECRET).is_err());

    let other_token = login(&mut client, "frank@example.com", "pw", OTHER_APP_ID)
        .await
        .unwrap();
    assert_eq!(
        decode_claims(&other_token, OTHER_APP_SECRET).unwrap().app_id,
        OTHER_APP_ID
    );
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let server = start_test_server().await;
    let mut client = AuthClient::connect(server.url.clone()).await.unwrap();

    register(&mut client, "bob@example.com", "right-password")
        .await
        .unwrap();

    let wrong_pass = login(&mut client, "bob@example.com", "wrong-password", APP_ID)
        .await
        .unwrap_err();
    let no_user = login(&mut client, "nobody@example.com", "whatever", APP_ID)
        .await
        .unwrap_err();

    assert_eq!(wrong_pass.code(), Code::Unauthenticated);
    assert_eq!(no_user.code(), Code::Unauthenticated);
    assert_eq!(wrong_pass.message(), no_user.message());
}

#[tokio::test]
async fn duplicate_registration_is_rejected_and_first_account_survives() {
    let server = start_test_server().await;
    let mut client = AuthClient::connect(server.url.clone()).await.unwrap();

    let first = register(&mut client, "carol@example.com", "original")
        .await
        .unwrap();

    let err = register(&mut client, "carol@example.com", "usurper")
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::AlreadyExists);

    let token = login(&mut client, "carol@example.com", "original", APP_ID)
        .await
        .expect("first registration still logs in");
    assert_eq!(decode_claims(&token, APP_SECRET).unwrap().uid, first);
}

#[tokio::test]
async fn unknown_application_fails_distinctly() {
    let server = start_test_server().await;
    let mut client = AuthClient::connect(server.url.clone()).await.unwrap();

    register(&mut client, "dave@example.com", "pw").await.unwrap();

    let err = login(&mut client, "dave@example.com", "pw", 999)
        .await
        .unwrap_err();

    assert_eq!(err.code(), Code::NotFound);
    assert_ne!(err.message(), "invalid credentials");
}

#[tokio::test]
async fn admin_flag_is_reported_through_role_lookup() {
    let server = start_test_server().await;
    let mut client = AuthClient::connect(server.url.clone()).await.unwrap();

    let uid = register(&mut client, "erin@example.com", "pw").await.unwrap();

    let response = client
        .is_admin(Request::new(IsAdminRequest { user_id: uid }))
        .await
        .unwrap();
    assert!(!response.into_inner().is_admin);

    sqlx::query("UPDATE users SET is_admin = 1 WHERE id = ?1")
        .bind(uid)
        .execute(server.storage.pool())
        .await
        .unwrap();

    let response = client
        .is_admin(Request::new(IsAdminRequest { user_id: uid }))
        .await
        .unwrap();
    assert!(response.into_inner().is_admin);

    let err = client
        .is_admin(Request::new(IsAdminRequest { user_id: 99_999 }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn malformed_requests_are_invalid_argument() {
    let server = start_test_server().await;
    let mut client = AuthClient::connect(server.url.clone()).await.unwrap();

    let err = register(&mut client, "", "pw").await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    let err = register(&mut client, "grace@example.com", "").await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    let err = login(&mut client, "grace@example.com", "pw", 0)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    let err = client
        .is_admin(Request::new(IsAdminRequest { user_id: 0 }))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn concurrent_registrations_with_distinct_emails_get_unique_ids() {
    let server = start_test_server().await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let url = server.url.clone();
        handles.push(tokio::spawn(async move {
            let mut client = AuthClient::connect(url).await.unwrap();
            register(&mut client, &format!("user{i}@example.com"), "pw")
                .await
                .expect("distinct emails all register")
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }

    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8, "every registration got a unique id");
}

#[tokio::test]
async fn concurrent_registrations_with_one_email_yield_one_winner() {
    let server = start_test_server().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let url = server.url.clone();
        handles.push(tokio::spawn(async move {
            let mut client = AuthClient::connect(url).await.unwrap();
            register(&mut client, "contested@example.com", "pw").await
        }));
    }

    let mut successes = 0;
    let mut already_exists = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(status) => {
                assert_eq!(status.code(), Code::AlreadyExists);
                already_exists += 1;
            }
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(already_exists, 7);
}
