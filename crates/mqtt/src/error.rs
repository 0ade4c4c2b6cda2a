//! Unified error handling for MQTT transport operations.
//!
//! `TransferError` aggregates the failure modes of this crate: configuration
//! problems caught at startup, local enqueue failures, and connection-level
//! errors surfaced by the event loop. Application code can pattern-match on
//! the variant to decide between fail-fast and wait-for-reconnect.

use thiserror::Error;

/// The unified error type for MQTT transport operations.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Endpoint metadata is invalid (empty topic, QoS outside 0-2).
    ///
    /// This is a configuration error: catch it at startup, there is nothing
    /// to retry.
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Client construction failed before any network activity.
    #[error("Client setup error: {0}")]
    ClientSetup(String),

    /// Configuration validation failed (`validator` constraint violations).
    #[error("Configuration error: {0}")]
    ConfigError(#[from] validator::ValidationErrors),

    /// The local client could not accept a request.
    ///
    /// Usually means the outgoing request channel is full or the client has
    /// shut down. Transient from the caller's point of view.
    #[error("Client transfer error: {0}")]
    ClientTransfer(#[from] rumqttc::ClientError),

    /// The connection to the broker failed or was lost.
    ///
    /// The connection kernel retries these automatically with backoff;
    /// callers only see this variant when the error was fatal.
    ///
    /// Boxed to keep the enum small.
    #[error("Client connection error: {0}")]
    ClientConnection(#[from] Box<rumqttc::ConnectionError>),

    /// Reconnect policy exhausted: the backoff schedule ran out of attempts.
    ///
    /// Indicates a sustained outage rather than a transient glitch.
    #[error("Retry policy error: {0}")]
    RetriesPolicy(#[from] super::backoff::BackoffError),

    /// Local I/O failure (not network traffic).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ConnectionError is large; box it when converting so the `?` operator keeps
// working without bloating TransferError.
impl From<rumqttc::ConnectionError> for TransferError {
    fn from(err: rumqttc::ConnectionError) -> Self {
        TransferError::ClientConnection(Box::new(err))
    }
}
