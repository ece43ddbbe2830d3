use std::str::FromStr;

use serde::Deserialize;

/// Cookie settings for the session token.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    /// Unsigned, so a negative value in the environment falls back to the default.
    pub max_age_days: u32,
    pub secure: bool,
}

/// Argon2 work factor.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub session: SessionConfig,
    pub password: PasswordConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "session_token".into()),
            max_age_days: env_or("SESSION_COOKIE_MAX_AGE_DAYS", 7),
            secure: env_or("SESSION_COOKIE_SECURE", false),
        };
        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: env_or("PASSWORD_HASH_MEMORY_KIB", defaults.memory_kib),
            iterations: env_or("PASSWORD_HASH_ITERATIONS", defaults.iterations),
            parallelism: env_or("PASSWORD_HASH_PARALLELISM", defaults.parallelism),
        };
        Ok(Self {
            database_url,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10),
            session,
            password,
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
