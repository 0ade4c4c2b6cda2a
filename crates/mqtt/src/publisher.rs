//! Topic-bound message publishing.
//!
//! A `Publisher` is the capability object for one output topic: it captures
//! the topic name, QoS and retain flag at construction time, validates them
//! once, and afterwards only enqueues payloads. Invalid metadata is
//! therefore a construction error, never a publish-time surprise.

use std::sync::Arc;

use rumqttc::QoS;
use tracing::debug;

use super::{config::EndpointMetadata, manager::MqttInstance, TransferError};

/// Publish handle bound to a single topic.
///
/// Cheap to clone; clones share the underlying transport instance.
#[derive(Clone)]
pub struct Publisher {
    /// The running transport this handle enqueues into.
    instance: Arc<MqttInstance>,

    /// Topic the handle is bound to.
    topic: String,

    /// Delivery settings resolved at construction.
    qos: QoS,
    retain: bool,
}

impl Publisher {
    /// Binds a publish handle to the topic described by `metadata`.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidMetadata` when the topic is empty or
    /// the QoS value is outside 0-2. This fails before anything is armed,
    /// so a misconfigured endpoint never produces traffic.
    pub fn new(
        instance: Arc<MqttInstance>,
        metadata: EndpointMetadata,
    ) -> Result<Self, TransferError> {
        use validator::Validate;
        metadata
            .validate()
            .map_err(|e| TransferError::InvalidMetadata(e.to_string()))?;

        let qos = match metadata.qos {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            // Unreachable after validation, but kept total
            other => {
                return Err(TransferError::InvalidMetadata(format!(
                    "Invalid QoS value: {}",
                    other
                )));
            }
        };

        Ok(Self {
            instance,
            topic: metadata.topic,
            qos,
            retain: metadata.retain,
        })
    }

    /// The topic this handle publishes on.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Enqueues one UTF-8 payload on the bound topic.
    ///
    /// This only hands the message to the local client; actual delivery is
    /// the event loop's business and follows the broker connection state.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::ClientTransfer` when the local request
    /// channel rejects the message (backlog full or client shut down).
    pub async fn publish(&self, payload: &str) -> Result<(), TransferError> {
        debug!(
            "Publishing to topic '{}': {} bytes (qos: {:?})",
            self.topic,
            payload.len(),
            self.qos
        );

        self.instance
            .client()
            .publish(self.topic.clone(), self.qos, self.retain, payload.as_bytes().to_vec())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::MqttManager;

    async fn test_instance() -> Arc<MqttInstance> {
        let manager = MqttManager::new("localhost", 1883).unwrap();
        Arc::new(manager.build_and_start().await.unwrap())
    }

    fn metadata(topic: &str, qos: u8) -> EndpointMetadata {
        EndpointMetadata {
            topic: topic.to_string(),
            qos,
            retain: false,
        }
    }

    #[tokio::test]
    async fn binds_to_valid_topic() {
        let instance = test_instance().await;
        let publisher = Publisher::new(instance.clone(), metadata("chatter", 0)).unwrap();
        assert_eq!(publisher.topic(), "chatter");
        instance.cancel_token().cancel();
    }

    #[tokio::test]
    async fn rejects_empty_topic() {
        let instance = test_instance().await;
        let result = Publisher::new(instance.clone(), metadata("", 0));
        assert!(matches!(result, Err(TransferError::InvalidMetadata(_))));
        instance.cancel_token().cancel();
    }

    #[tokio::test]
    async fn rejects_invalid_qos() {
        let instance = test_instance().await;
        let result = Publisher::new(instance.clone(), metadata("chatter", 3));
        assert!(matches!(result, Err(TransferError::InvalidMetadata(_))));
        instance.cancel_token().cancel();
    }

    #[tokio::test]
    async fn publish_enqueues_without_broker() {
        // Enqueueing is local: it must succeed while the connection is still
        // being established, as long as the backlog has room.
        let instance = test_instance().await;
        let publisher = Publisher::new(instance.clone(), metadata("chatter", 0)).unwrap();

        let result = publisher.publish("hello world 0").await;
        assert!(result.is_ok());

        instance.cancel_token().cancel();
    }
}
