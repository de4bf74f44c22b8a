use std::fmt;

/// Transport state transitions seen by the store client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// A connection attempt is starting.
    Connecting,
    Connected,
    /// Handshake finished; commands can be issued.
    Ready,
    Closed,
    Reconnecting,
    Error(String),
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionEvent::Connecting => write!(f, "connecting"),
            ConnectionEvent::Connected => write!(f, "connected"),
            ConnectionEvent::Ready => write!(f, "ready"),
            ConnectionEvent::Closed => write!(f, "closed"),
            ConnectionEvent::Reconnecting => write!(f, "reconnecting"),
            ConnectionEvent::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// Receives connection events from a [`StoreClient`](crate::store::StoreClient).
///
/// Called inline on the task that observed the transition, so implementations
/// must not block.
pub trait ConnectionObserver: Send + Sync {
    fn notify(&self, event: &ConnectionEvent);
}

/// Writes connection events to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingObserver {
    verbose: bool,
}

impl LoggingObserver {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl ConnectionObserver for LoggingObserver {
    fn notify(&self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::Connecting => {
                if self.verbose {
                    tracing::debug!("[Store] Waiting for connection");
                }
            }
            ConnectionEvent::Connected => tracing::info!("[Store] Connected successfully"),
            ConnectionEvent::Ready => tracing::info!("[Store] Ready to accept commands"),
            ConnectionEvent::Closed => tracing::warn!("[Store] Connection closed"),
            ConnectionEvent::Reconnecting => tracing::warn!("[Store] Reconnecting..."),
            ConnectionEvent::Error(message) => {
                tracing::error!("[Store] Connection error: {}", message)
            }
        }
    }
}
