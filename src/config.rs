use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while reading configuration. Always fatal at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVars(Vec<&'static str>),
    #[error("{name} has invalid value '{value}': {reason}")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Deployment environment, selected by `NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(env::var("NODE_ENV").ok().as_deref())
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// Reconnect backoff. Each delay is picked at random below
/// `factor_ms * exponent_base^n` (n counts from 1), and never exceeds `max_delay_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub exponent_base: u64,
    pub factor_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            exponent_base: 2,
            factor_ms: 50,
            max_delay_ms: 2000,
        }
    }
}

/// Connection settings for the backing store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub max_retries: usize,
    pub retry: RetryPolicy,
}

impl StoreConfig {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(10_000);
    pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_millis(5_000);
    pub const DEFAULT_MAX_RETRIES: usize = 1;

    /// Settings for `host:port` with every optional field at its default.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: None,
            db: 0,
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            command_timeout: Self::DEFAULT_COMMAND_TIMEOUT,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            retry: RetryPolicy::default(),
        }
    }

    /// Checks the fields a connection cannot be built without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.host.trim().is_empty() {
            missing.push("REDIS_HOST");
        }
        if self.port == 0 {
            missing.push("REDIS_PORT");
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingVars(missing))
        }
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("db", &self.db)
            .field("connect_timeout", &self.connect_timeout)
            .field("command_timeout", &self.command_timeout)
            .field("max_retries", &self.max_retries)
            .field("retry", &self.retry)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub service_port: u16,
    pub service_host: String,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let (host, port) = match (var("REDIS_HOST"), var("REDIS_PORT")) {
            (Some(host), Some(port)) => (host, port),
            (host, port) => {
                let mut missing = Vec::new();
                if host.is_none() {
                    missing.push("REDIS_HOST");
                }
                if port.is_none() {
                    missing.push("REDIS_PORT");
                }
                return Err(ConfigError::MissingVars(missing));
            }
        };

        let port = parse_var("REDIS_PORT", &port, "must be a port number (1-65535)")?;
        if port == 0 {
            return Err(ConfigError::InvalidVar {
                name: "REDIS_PORT",
                value: "0".to_string(),
                reason: "must be a port number (1-65535)",
            });
        }

        let mut store = StoreConfig::new(host, port);
        store.password = var("REDIS_PASSWORD");

        if let Some(raw) = var("REDIS_DB") {
            let db: i64 = parse_var("REDIS_DB", &raw, "must be a non-negative integer")?;
            if db < 0 {
                return Err(ConfigError::InvalidVar {
                    name: "REDIS_DB",
                    value: raw,
                    reason: "must be a non-negative integer",
                });
            }
            store.db = db;
        }
        if let Some(raw) = var("REDIS_CONNECT_TIMEOUT_MS") {
            let ms = parse_var("REDIS_CONNECT_TIMEOUT_MS", &raw, "must be milliseconds")?;
            store.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(raw) = var("REDIS_COMMAND_TIMEOUT_MS") {
            let ms = parse_var("REDIS_COMMAND_TIMEOUT_MS", &raw, "must be milliseconds")?;
            store.command_timeout = Duration::from_millis(ms);
        }
        if let Some(raw) = var("REDIS_MAX_RETRIES") {
            store.max_retries =
                parse_var("REDIS_MAX_RETRIES", &raw, "must be a non-negative integer")?;
        }

        let service_port = match var("PORT") {
            Some(raw) => parse_var("PORT", &raw, "must be a valid port number (0-65535)")?,
            None => 8080,
        };
        let service_host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let environment = Environment::parse(var("NODE_ENV").as_deref());

        Ok(Config {
            store,
            service_port,
            service_host,
            environment,
        })
    }

    pub fn log_startup(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Environment: {:?}", self.environment);
        tracing::info!("  Store: {}:{} (db {})", self.store.host, self.store.port, self.store.db);
        if self.environment.is_development() {
            tracing::info!("  Store configuration: {:?}", self.store);
        }
        tracing::info!("  Service listening on: {}:{}", self.service_host, self.service_port);
    }
}

fn parse_var<T: std::str::FromStr>(
    name: &'static str,
    raw: &str,
    reason: &'static str,
) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidVar {
        name,
        value: raw.to_string(),
        reason,
    })
}
