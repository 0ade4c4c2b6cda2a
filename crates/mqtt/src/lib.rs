//! # chatterd-mqtt: publish-oriented MQTT transport layer
//!
//! A thin, reliability-focused layer over `rumqttc` for applications that
//! only ever *produce* messages. It provides:
//!
//! - **Client construction** from validated configuration
//! - **Connection supervision** with automatic reconnection and exponential
//!   backoff
//! - **State monitoring** through a watch channel (`ConnectionState`)
//! - **Topic-bound publishing**: a `Publisher` is tied to one topic, QoS and
//!   retain setting at construction time and only enqueues payloads
//!
//! Subscription handling is deliberately out of scope: consumers of this
//! crate are leaf producers.
//!
//! # Quick Start
//!
//! ```ignore
//! use chatterd_mqtt::{EndpointMetadata, MqttManager, Publisher};
//!
//! #[tokio::main]
//! async fn main() -> chatterd_mqtt::Result<()> {
//!     let manager = MqttManager::new("localhost", 1883)?;
//!     let instance = std::sync::Arc::new(manager.build_and_start().await?);
//!
//!     let metadata = EndpointMetadata {
//!         topic: "chatter".into(),
//!         qos: 0,
//!         retain: false,
//!     };
//!     let publisher = Publisher::new(instance, metadata)?;
//!
//!     publisher.publish("hello world 0").await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Application
//!     │  publish(payload)
//! ┌───▼───────────────────────────────┐
//! │ Publisher (topic-bound handle)    │
//! └───┬───────────────────────────────┘
//! ┌───▼───────────────────────────────┐
//! │ MqttManager / MqttInstance        │
//! │ ConnectionKernel (reconnects,     │
//! │ backoff, state broadcasting)      │
//! └───┬───────────────────────────────┘
//! ┌───▼───────────────────────────────┐
//! │ rumqttc AsyncClient & EventLoop   │
//! └───────────────────────────────────┘
//! ```
//!
//! The connection lifecycle is observable through
//! [`MqttInstance::state_receiver`]: `Connecting -> Connected`, and on
//! failures `Disconnected -> Reconnecting(delay) -> Connecting -> ...` until
//! either the broker accepts the connection again or the retry policy is
//! exhausted.

pub mod backoff;
pub mod client;
pub mod config;
pub mod connection;
pub mod error;
pub mod manager;
pub mod publisher;
pub mod state;

pub use backoff::{Backoff, BackoffError};
pub use client::ClientBuilder;
pub use config::{Config, EndpointMetadata, DEFAULT_QUEUE_DEPTH};
pub use connection::ConnectionKernel;
pub use error::TransferError;
pub use manager::{MqttInstance, MqttManager};
pub use publisher::Publisher;
pub use state::ConnectionState;

/// Result type for MQTT transport operations.
///
/// All fallible operations in this crate return this alias for
/// `std::result::Result<T, TransferError>`.
pub type Result<T> = std::result::Result<T, TransferError>;
