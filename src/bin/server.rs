use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use sso_grpc::auth::Auth;
use sso_grpc::proto::auth_server::AuthServer;
use sso_grpc::server::{AuthGrpc, ServerConfig};
use sso_grpc::storage::SqliteStorage;
use tokio::signal;
use tonic::transport::Server;
use tonic_health::server::health_reporter;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

type Service = AuthGrpc<SqliteStorage, SqliteStorage, SqliteStorage, SqliteStorage>;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Single-sign-on gRPC authentication server", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "SSO_CONFIG_PATH")]
    config: Option<PathBuf>,
}

fn init_tracing(env: &str) {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    // Pretty output for local hacking, JSON everywhere else.
    if env == "local" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Boot failures are fatal; per-request failures never are.
    let config = ServerConfig::load(args.config.as_deref())?;
    config
        .validate()
        .map_err(|e| format!("invalid configuration: {e}"))?;

    init_tracing(&config.env);

    info!(
        env = %config.env,
        port = config.grpc.port,
        "starting sso server"
    );

    let storage = SqliteStorage::open(&config.storage_path).await?;

    let auth = Auth::new(
        storage.clone(),
        storage.clone(),
        storage.clone(),
        storage,
        config.token_ttl(),
    );
    let service = AuthGrpc::new(auth, config.rate_limit.build_limiter());

    let (mut health_reporter, health_service) = health_reporter();
    health_reporter.set_serving::<AuthServer<Service>>().await;

    let addr = config.grpc.addr();
    info!(%addr, "listening");

    Server::builder()
        .timeout(Duration::from_secs(config.grpc.timeout_secs))
        .add_service(health_service)
        .add_service(AuthServer::new(service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    info!("server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Initiating graceful shutdown (allowing in-flight requests to complete)");
}
