use montage_core::voting::{
    VotingConfig, DEFAULT_BATCH_DURATION_HOURS, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MIN_VOTES,
    DEFAULT_PERCENTAGE_THRESHOLD,
};
use montage_pi::PiConfig;
use montage_voting::coordinator::DEFAULT_LEASE_MINUTES;

use crate::auth::jwt::JwtConfig;

/// Default interval between voting ticks (assignment and expiry sweep).
pub const DEFAULT_VOTING_TICK_SECS: u64 = 60;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long background tasks get to stop after shutdown starts (default: `5`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Pi platform client settings.
    pub pi: PiConfig,
    /// Batch window and approval thresholds.
    pub voting: VotingConfig,
    /// Seconds between voting ticks.
    pub voting_tick_secs: u64,
    /// Minutes an evaluator may hold a batch lease.
    pub batch_lease_minutes: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `SHUTDOWN_TIMEOUT_SECS`| `5`                        |
    /// | `VOTING_TICK_SECS`     | `60`                       |
    /// | `BATCH_LEASE_MINUTES`  | `5`                        |
    ///
    /// JWT, Pi and voting settings are read by [`JwtConfig::from_env`],
    /// [`PiConfig::from_env`] and [`voting_config_from_env`].
    ///
    /// # Panics
    ///
    /// Panics if a variable is set but cannot be parsed, or if the voting
    /// thresholds are out of range.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let voting_tick_secs: u64 = std::env::var("VOTING_TICK_SECS")
            .unwrap_or_else(|_| DEFAULT_VOTING_TICK_SECS.to_string())
            .parse()
            .expect("VOTING_TICK_SECS must be a valid u64");
        assert!(voting_tick_secs > 0, "VOTING_TICK_SECS must be positive");

        let batch_lease_minutes: i64 = std::env::var("BATCH_LEASE_MINUTES")
            .unwrap_or_else(|_| DEFAULT_LEASE_MINUTES.to_string())
            .parse()
            .expect("BATCH_LEASE_MINUTES must be a valid i64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            pi: PiConfig::from_env(),
            voting: voting_config_from_env(),
            voting_tick_secs,
            batch_lease_minutes,
        }
    }
}

/// Load voting thresholds from environment variables.
///
/// | Env Var                        | Default |
/// |--------------------------------|---------|
/// | `VOTING_BATCH_HOURS`           | `24`    |
/// | `VOTING_MIN_VOTES`             | `3`     |
/// | `VOTING_PERCENTAGE_THRESHOLD`  | `0.6`   |
/// | `VOTING_MAX_BATCH_SIZE`        | `10`    |
pub fn voting_config_from_env() -> VotingConfig {
    let batch_hours: i64 = std::env::var("VOTING_BATCH_HOURS")
        .unwrap_or_else(|_| DEFAULT_BATCH_DURATION_HOURS.to_string())
        .parse()
        .expect("VOTING_BATCH_HOURS must be a valid i64");

    let min_votes: i32 = std::env::var("VOTING_MIN_VOTES")
        .unwrap_or_else(|_| DEFAULT_MIN_VOTES.to_string())
        .parse()
        .expect("VOTING_MIN_VOTES must be a valid i32");

    let percentage_threshold: f64 = std::env::var("VOTING_PERCENTAGE_THRESHOLD")
        .unwrap_or_else(|_| DEFAULT_PERCENTAGE_THRESHOLD.to_string())
        .parse()
        .expect("VOTING_PERCENTAGE_THRESHOLD must be a valid number");

    let max_batch_size: usize = std::env::var("VOTING_MAX_BATCH_SIZE")
        .unwrap_or_else(|_| DEFAULT_MAX_BATCH_SIZE.to_string())
        .parse()
        .expect("VOTING_MAX_BATCH_SIZE must be a valid usize");

    let config = VotingConfig {
        batch_duration: chrono::Duration::hours(batch_hours),
        min_votes,
        percentage_threshold,
        max_batch_size,
    };
    if let Err(e) = config.validate() {
        panic!("Invalid voting configuration: {e}");
    }
    config
}
