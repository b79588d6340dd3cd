use std::env;

use thiserror::Error;

/// Secret used when running locally without `JWT_SECRET`.
const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// never mutated afterwards; handlers and the auth extractor pull it out of the
/// shared state via `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and which settings are mandatory.
    pub env: Env,
    // Postgres connection string. `None` selects the in-memory store (local only).
    pub db_url: Option<String>,
    // HMAC secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    // Lifetime of issued tokens.
    pub jwt_ttl_minutes: i64,
    // Address the HTTP listener binds to.
    pub bind_address: String,
    // Run the seeders after migrations.
    pub seed_database: bool,
}

/// Env
///
/// Defines the runtime context, used to switch between developer conveniences
/// (pretty logs, in-memory store, fallback secret) and hardened production settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("{var} has an invalid value: {value}")]
    Invalid { var: &'static str, value: String },
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for test state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            db_url: None,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            jwt_ttl_minutes: 60,
            bind_address: "0.0.0.0:8000".to_string(),
            seed_database: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables. Production refuses to start
    /// without an explicit database and signing secret; local falls back to defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let db_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let jwt_secret = env::var("JWT_SECRET").ok().filter(|secret| !secret.is_empty());

        let (db_url, jwt_secret) = match env {
            Env::Production => (
                Some(db_url.ok_or(ConfigError::Missing("DATABASE_URL"))?),
                jwt_secret.ok_or(ConfigError::Missing("JWT_SECRET"))?,
            ),
            Env::Local => (
                db_url,
                jwt_secret.unwrap_or_else(|| LOCAL_JWT_SECRET.to_string()),
            ),
        };

        let jwt_ttl_minutes = match env::var("JWT_TTL_MINUTES") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(minutes) if minutes > 0 => minutes,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "JWT_TTL_MINUTES",
                        value: raw,
                    });
                }
            },
            Err(_) => 60,
        };

        let seed_database = matches!(
            env::var("SEED_DATABASE").as_deref(),
            Ok("true") | Ok("1")
        );

        Ok(Self {
            env,
            db_url,
            jwt_secret,
            jwt_ttl_minutes,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            seed_database,
        })
    }
}
