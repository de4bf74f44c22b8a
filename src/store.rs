use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{
    AsyncCommands, ConnectionAddr, ConnectionInfo, ErrorKind, RedisConnectionInfo, RedisError,
    RedisResult,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::{ConfigError, StoreConfig};
use crate::events::{ConnectionEvent, ConnectionObserver};

/// Deadline applied by [`StoreClient::ping`].
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Failures surfaced by store operations. None of them are fatal to the process.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The probe did not finish before its deadline.
    #[error("Store ping timed out after {}ms", .0.as_millis())]
    ProbeTimeout(Duration),
    /// The transport reported an error while probing.
    #[error("Store ping failed: {0}")]
    Probe(String),
    /// A GET or SET failed in the transport.
    #[error("Store {op} failed: {message}")]
    Operation { op: &'static str, message: String },
}

impl StoreError {
    fn operation(op: &'static str, err: RedisError) -> Self {
        StoreError::Operation {
            op,
            message: err.to_string(),
        }
    }
}

/// Shareable store client for use across async handlers
///
/// Owns a single multiplexed connection that is established on first use and
/// reused by every clone. Once established the handle is never replaced; the
/// underlying `ConnectionManager` reconnects on its own with exponential
/// backoff, and commands issued while it is reconnecting fail immediately.
#[derive(Clone)]
pub struct StoreClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: StoreConfig,
    observer: Arc<dyn ConnectionObserver>,
    connection: OnceCell<ConnectionManager>,
    connection_lost: AtomicBool,
}

impl StoreClient {
    /// Validate the configuration and prepare the client.
    ///
    /// No I/O happens here. Missing host or port is reported as a
    /// [`ConfigError`] so the caller can refuse to start.
    pub fn initialize(
        config: StoreConfig,
        observer: Arc<dyn ConnectionObserver>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        tracing::info!("[Store] Connecting to {}:{}", config.host, config.port);

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                observer,
                connection: OnceCell::new(),
                connection_lost: AtomicBool::new(false),
            }),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Probe the store with the default [`PROBE_TIMEOUT`].
    pub async fn ping(&self) -> Result<Duration, StoreError> {
        self.ping_within(PROBE_TIMEOUT).await
    }

    /// Send PING and return the observed latency.
    ///
    /// The deadline covers establishing the connection as well as the command
    /// itself. When it expires the in-flight work is dropped and
    /// [`StoreError::ProbeTimeout`] is returned.
    pub async fn ping_within(&self, deadline: Duration) -> Result<Duration, StoreError> {
        let started = Instant::now();

        let probe = async {
            let mut conn = self.connection().await?;
            let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
            Ok::<_, RedisError>(pong)
        };

        match tokio::time::timeout(deadline, probe).await {
            Ok(result) => {
                self.observe(&result);
                let latency = started.elapsed();
                result
                    .map(|_| latency)
                    .map_err(|err| StoreError::Probe(err.to_string()))
            }
            Err(_) => {
                tracing::warn!("[Store] Ping exceeded {}ms deadline", deadline.as_millis());
                Err(StoreError::ProbeTimeout(deadline))
            }
        }
    }

    /// Read a string value. `Ok(None)` when the key does not exist.
    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = async {
            let mut conn = self.connection().await?;
            let value: Option<String> = conn.get(key).await?;
            Ok::<_, RedisError>(value)
        }
        .await;

        self.observe(&result);
        result.map_err(|err| StoreError::operation("GET", err))
    }

    /// Write a string value, overwriting any previous one.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let result = async {
            let mut conn = self.connection().await?;
            let _: () = conn.set(key, value).await?;
            Ok::<_, RedisError>(())
        }
        .await;

        self.observe(&result);
        result.map_err(|err| StoreError::operation("SET", err))
    }

    async fn connection(&self) -> RedisResult<ConnectionManager> {
        let conn = self
            .inner
            .connection
            .get_or_try_init(|| self.connect())
            .await?;
        Ok(conn.clone())
    }

    async fn connect(&self) -> RedisResult<ConnectionManager> {
        let config = &self.inner.config;
        self.emit(ConnectionEvent::Connecting);

        let addr = resolve_ipv4(&config.host, config.port).await?;
        let client = redis::Client::open(connection_info(config, addr))?;
        let manager = ConnectionManager::new_with_config(client, manager_config(config)).await?;

        tracing::debug!("[Store] Established connection to {}", addr);
        self.emit(ConnectionEvent::Connected);
        self.emit(ConnectionEvent::Ready);
        Ok(manager)
    }

    /// Translate a command outcome into connection events.
    fn observe<T>(&self, result: &RedisResult<T>) {
        match result {
            Ok(_) => {
                if self.inner.connection_lost.swap(false, Ordering::AcqRel) {
                    self.emit(ConnectionEvent::Connected);
                    self.emit(ConnectionEvent::Ready);
                }
            }
            Err(err) => {
                self.emit(ConnectionEvent::Error(err.to_string()));
                // A loss only makes sense once a connection was established.
                if self.inner.connection.initialized()
                    && is_connection_loss(err)
                    && !self.inner.connection_lost.swap(true, Ordering::AcqRel)
                {
                    self.emit(ConnectionEvent::Closed);
                    self.emit(ConnectionEvent::Reconnecting);
                }
            }
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        self.inner.observer.notify(&event);
    }
}

fn is_connection_loss(err: &RedisError) -> bool {
    err.is_connection_dropped() || err.is_connection_refusal() || err.is_io_error()
}

/// Resolve `host` and keep the first IPv4 address.
async fn resolve_ipv4(host: &str, port: u16) -> RedisResult<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| {
            RedisError::from((
                ErrorKind::IoError,
                "No IPv4 address found for store host",
                host.to_string(),
            ))
        })
}

fn connection_info(config: &StoreConfig, addr: SocketAddr) -> ConnectionInfo {
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(addr.ip().to_string(), addr.port()),
        redis: RedisConnectionInfo {
            db: config.db,
            password: config.password.clone(),
            ..Default::default()
        },
    }
}

fn manager_config(config: &StoreConfig) -> ConnectionManagerConfig {
    ConnectionManagerConfig::new()
        .set_number_of_retries(config.max_retries)
        .set_exponent_base(config.retry.exponent_base)
        .set_factor(config.retry.factor_ms)
        .set_max_delay(config.retry.max_delay_ms)
        .set_connection_timeout(config.connect_timeout)
        .set_response_timeout(config.command_timeout)
}
