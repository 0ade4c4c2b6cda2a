//! Configuration structures for the MQTT transport.
//!
//! All types here are serde-deserializable (TOML in practice) and validated
//! with the `validator` crate, so a broken configuration fails at load time
//! rather than at connect time.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default capacity of the client's outgoing request channel.
///
/// This bounds how many publishes may be queued locally before the transport
/// applies backpressure.
pub const DEFAULT_QUEUE_DEPTH: usize = 10;

/// MQTT broker connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    /// Broker hostname or IP address.
    #[validate(length(
        min = 1,
        max = 255,
        message = "Host must be between 1 and 255 characters"
    ))]
    pub host: String,

    /// Broker port (1883 for plain TCP by convention).
    #[validate(range(min = 1, max = 65535, message = "Port must be between 1 and 65535"))]
    pub port: u16,

    /// Client identifier presented to the broker.
    ///
    /// When empty, a random UUID is generated at build time. Brokers use the
    /// id for collision policies and session bookkeeping.
    #[validate(length(max = 36, message = "Client id must not exceed 36 characters"))]
    pub client_id: String,

    /// Keep-alive interval in seconds. The broker drops the connection when
    /// no packet arrives within this window; the client pings to prevent it.
    #[validate(range(
        min = 5,
        max = 3600,
        message = "Keep alive must be between 5 and 3600 seconds"
    ))]
    pub keep_alive: u64,

    /// Whether to request a clean session. A producer with no subscriptions
    /// has no session state worth retaining, so this defaults to true.
    pub clean_session: bool,

    /// Maximum number of QoS 1/2 publishes awaiting acknowledgement.
    #[validate(range(
        min = 1,
        max = 1000,
        message = "Max inflight must be between 1 and 1000"
    ))]
    pub max_inflight: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: String::new(),
            keep_alive: 60,
            clean_session: true,
            max_inflight: 10,
        }
    }
}

/// Publication metadata for a single endpoint: where and how to publish.
///
/// A `Publisher` captures one of these at construction time and applies it to
/// every payload it sends.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EndpointMetadata {
    /// Topic name the payloads are published on.
    #[validate(length(min = 1, message = "Topic must not be empty"))]
    pub topic: String,

    /// Quality of Service level (0, 1 or 2).
    #[validate(range(min = 0, max = 2, message = "QoS must be 0, 1 or 2"))]
    pub qos: u8,

    /// Whether the broker should retain the last payload for new subscribers.
    pub retain: bool,
}

impl Default for EndpointMetadata {
    fn default() -> Self {
        Self {
            topic: String::new(),
            qos: 0,
            retain: false,
        }
    }
}
