use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
    pub cookie_name: String,
    pub secure_cookie: bool,
    /// When set, a bearer token is only accepted while the session named by its `jti` is active.
    pub enforce: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
}

/// Snapshot write policy. Without `enforce_monotonic` a snapshot overwrites
/// the stored counters; with it, counters may only grow by at most one step.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsLimits {
    pub enforce_monotonic: bool,
    pub max_counter_step: i64,
    pub max_xp_step: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub production: bool,
    pub frontend_url: String,
    pub static_dir: Option<String>,
    pub jwt: JwtConfig,
    pub session: SessionConfig,
    pub password: PasswordConfig,
    pub rate_limit: RateLimitConfig,
    pub stats: StatsLimits,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let production = env_string("APP_ENV", "development") == "production";

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: env_string("JWT_ISSUER", "exoai-explorer"),
            audience: env_string("JWT_AUDIENCE", "exoai-explorer-users"),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60 * 24),
        };
        let session = SessionConfig {
            ttl_minutes: env_or("SESSION_TTL_MINUTES", 60 * 24),
            cookie_name: env_string("SESSION_COOKIE_NAME", "exoai.sid"),
            secure_cookie: production,
            enforce: env_or("AUTH_ENFORCE_SESSIONS", false),
        };
        let password = PasswordConfig {
            memory_kib: env_or("ARGON2_MEMORY_KIB", 19 * 1024),
            iterations: env_or("ARGON2_ITERATIONS", 2),
            parallelism: env_or("ARGON2_PARALLELISM", 1),
        };
        let rate_limit = RateLimitConfig {
            window_secs: env_or("RATE_LIMIT_WINDOW_SECS", 15 * 60),
            max_requests: env_or("RATE_LIMIT_MAX_REQUESTS", 100),
        };
        let stats = StatsLimits {
            enforce_monotonic: env_or("STATS_ENFORCE_MONOTONIC", false),
            max_counter_step: env_or("STATS_MAX_COUNTER_STEP", 1000),
            max_xp_step: env_or("STATS_MAX_XP_STEP", 10_000),
        };

        Ok(Self {
            database_url,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            host: env_string("APP_HOST", "0.0.0.0"),
            port: env_or("APP_PORT", 3000),
            production,
            frontend_url: env_string("FRONTEND_URL", "http://localhost:8005"),
            static_dir: std::env::var("STATIC_DIR").ok().filter(|s| !s.is_empty()),
            jwt,
            session,
            password,
            rate_limit,
            stats,
        })
    }
}
