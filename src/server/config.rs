use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tonic::Status;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Environment name: `local`, `dev` or `prod`. Affects only the log
    /// format, never behavior.
    pub env: String,
    /// Path to the SQLite database file.
    pub storage_path: String,
    /// Validity window of issued session tokens, in seconds.
    pub token_ttl_secs: u64,
    /// gRPC listener settings.
    pub grpc: GrpcSettings,
    /// Rate limiting configuration.
    pub rate_limit: RateLimitSettings,
}

/// gRPC listener settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrpcSettings {
    /// Hostname or IP address to bind to.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl GrpcSettings {
    /// Converts host and port into a socket address.
    ///
    /// # Panics
    /// Panics if the host and port cannot be parsed into a valid socket
    /// address, which only happens with a malformed configuration and is
    /// caught at boot.
    pub fn addr(&self) -> SocketAddr {
        format!("{}:{}", self.host, self.port)
            .parse()
            .unwrap_or_else(|e| {
                panic!(
                    "Invalid server address configuration (host: {}, port: {}): {}",
                    self.host, self.port, e
                )
            })
    }
}

/// Rate limiting settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RateLimitSettings {
    /// Maximum requests per minute.
    pub requests_per_minute: u64,
    /// Burst capacity for short-term spikes.
    pub burst: u64,
}

impl RateLimitSettings {
    /// Creates a rate limiter from these settings.
    pub fn build_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.requests_per_minute, self.burst)
    }
}

/// Rate limiter using a token bucket.
///
/// Thread-safe and shared across all in-flight requests of the service.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<RateLimiterState>>,
    rate: u64,
    burst: u64,
}

struct RateLimiterState {
    tokens: f64,
    last_update: Instant,
}

impl RateLimiter {
    /// Creates a new rate limiter.
    ///
    /// # Arguments
    /// * `requests_per_minute` - Maximum sustained request rate
    /// * `burst` - Maximum burst capacity
    pub fn new(requests_per_minute: u64, burst: u64) -> Self {
        Self {
            state: Arc::new(Mutex::new(RateLimiterState {
                tokens: burst as f64,
                last_update: Instant::now(),
            })),
            rate: requests_per_minute,
            burst,
        }
    }

    /// Attempts to acquire a token for a request.
    ///
    /// Returns `Ok(())` if a token was acquired, `Err(Status)` if the rate
    /// limit is exceeded.
    pub async fn check_rate_limit(&self) -> Result<(), Status> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_update).as_secs_f64();

        let tokens_per_second = self.rate as f64 / 60.0;
        state.tokens = (state.tokens + elapsed * tokens_per_second).min(self.burst as f64);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            state.last_update = now;
            Ok(())
        } else {
            Err(Status::resource_exhausted("Rate limit exceeded"))
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            env: "local".to_string(),
            storage_path: "data/sso.db".to_string(),
            token_ttl_secs: 3600,
            grpc: GrpcSettings {
                host: "127.0.0.1".to_string(),
                port: 44044,
                timeout_secs: 10,
            },
            rate_limit: RateLimitSettings {
                requests_per_minute: 600,
                burst: 50,
            },
        }
    }
}

impl ServerConfig {
    /// Loads configuration from `.env` file, TOML file, and environment
    /// variables.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables with `SSO_` prefix, nested keys separated by
    ///    `__` (e.g. `SSO_GRPC__PORT=44044`, `SSO_STORAGE_PATH=/var/sso.db`)
    /// 2. TOML configuration file (the given path, or `config/server.toml`)
    /// 3. `.env` file, if present
    /// 4. Built-in defaults
    #[allow(clippy::result_large_err)]
    pub fn load(path: Option<&Path>) -> figment::error::Result<Self> {
        use figment::providers::{Env, Format, Serialized, Toml};
        use figment::Figment;

        // Missing .env is not an error.
        let _ = dotenvy::dotenv();

        let default_path = Path::new("config/server.toml");
        let path = path.unwrap_or(default_path);

        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SSO_").split("__"))
            .extract()
    }

    /// Token TTL as a [`Duration`].
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// Validates the configuration before boot.
    pub fn validate(&self) -> Result<(), String> {
        match self.env.as_str() {
            "local" | "dev" | "prod" => {}
            other => return Err(format!("unknown env '{other}' (expected local|dev|prod)")),
        }

        if self.storage_path.is_empty() {
            return Err("storage_path cannot be empty".to_string());
        }

        if self.token_ttl_secs == 0 {
            return Err("token_ttl_secs cannot be zero".to_string());
        }

        if self.rate_limit.requests_per_minute == 0 {
            return Err("rate limit requests_per_minute cannot be zero".to_string());
        }

        if self.rate_limit.burst == 0 {
            return Err("rate limit burst cannot be zero".to_string());
        }

        Ok(())
    }
}
