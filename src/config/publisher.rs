//! Configuration for the periodic publisher.
//!
//! One section, one publisher: the topic it announces on, the tick cadence,
//! and the outgoing backlog bound. The defaults describe the canonical
//! deployment — `chatter` every 500 ms with a queue depth of 10 — so an
//! empty configuration file (or none at all) yields a working process.

use std::time::Duration;

use chatterd_mqtt::EndpointMetadata;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings of the periodic publisher.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PublisherConfig {
    /// Topic the messages are published on.
    #[validate(length(min = 1, message = "Topic must not be empty"))]
    pub topic: String,

    /// Tick period in milliseconds; one message is emitted per tick.
    #[validate(range(min = 1, message = "Publish period must be at least 1 ms"))]
    pub period_ms: u64,

    /// How many unconsumed messages may be buffered locally before the
    /// transport applies its own backpressure policy.
    #[validate(range(
        min = 1,
        max = 1000,
        message = "Queue depth must be between 1 and 1000"
    ))]
    pub queue_depth: u32,

    /// Quality of Service level for emitted messages (0, 1 or 2).
    #[validate(range(min = 0, max = 2, message = "QoS must be 0, 1 or 2"))]
    pub qos: u8,

    /// Whether the broker should retain the latest message.
    pub retain: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            topic: "chatter".to_string(),
            period_ms: 500,
            queue_depth: 10,
            qos: 0,
            retain: false,
        }
    }
}

impl PublisherConfig {
    /// Tick period as a `Duration`.
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Endpoint metadata for binding the publish handle.
    pub fn endpoint(&self) -> EndpointMetadata {
        EndpointMetadata {
            topic: self.topic.clone(),
            qos: self.qos,
            retain: self.retain,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_canonical_publisher() {
        let config = PublisherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.topic, "chatter");
        assert_eq!(config.period(), Duration::from_millis(500));
        assert_eq!(config.queue_depth, 10);
        assert_eq!(config.qos, 0);
        assert!(!config.retain);
    }

    #[test]
    fn empty_topic_is_rejected() {
        let config = PublisherConfig {
            topic: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_period_is_rejected() {
        let config = PublisherConfig {
            period_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn queue_depth_bounds_are_enforced() {
        let zero = PublisherConfig {
            queue_depth: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let huge = PublisherConfig {
            queue_depth: 100_000,
            ..Default::default()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn endpoint_carries_topic_and_delivery_settings() {
        let config = PublisherConfig {
            topic: "announcements".to_string(),
            qos: 1,
            retain: true,
            ..Default::default()
        };

        let endpoint = config.endpoint();
        assert_eq!(endpoint.topic, "announcements");
        assert_eq!(endpoint.qos, 1);
        assert!(endpoint.retain);
    }
}
