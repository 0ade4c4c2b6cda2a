//! MQTT client construction.
//!
//! `ClientBuilder` wraps the setup of rumqttc's `AsyncClient` and
//! `EventLoop`, applying validated configuration and a channel capacity that
//! bounds the local publish backlog. The two returned halves belong
//! together: the client enqueues requests, the event loop pumps them to the
//! broker (see `ConnectionKernel`).

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions};

use super::{config::Config, error::TransferError};

/// Fluent builder for an MQTT client and its event loop.
///
/// Consumed by [`ClientBuilder::build`] so a half-configured builder cannot
/// be reused.
pub struct ClientBuilder {
    /// Protocol options: host, port, keep-alive, session handling.
    opts: MqttOptions,

    /// Capacity of the outgoing request channel. Publishes beyond this
    /// backlog hit local backpressure.
    cap: usize,
}

impl ClientBuilder {
    /// Creates a builder with explicit connection parameters.
    ///
    /// `cap` is the request channel capacity; for this crate's use case it
    /// is the publisher queue depth.
    pub fn new(
        client_id: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        cap: usize,
    ) -> Self {
        Self {
            opts: MqttOptions::new(client_id, host, port),
            cap,
        }
    }

    /// Creates a builder from validated configuration.
    ///
    /// An empty `client_id` is replaced with a random UUID so that two
    /// instances of the process never collide on the broker.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::ConfigError` when a `validator` constraint on
    /// the configuration is violated.
    pub fn from_config(config: &Config, cap: usize) -> Result<Self, TransferError> {
        use validator::Validate;
        config.validate()?;

        let client_id = if config.client_id.is_empty() {
            uuid::Uuid::new_v4().to_string()
        } else {
            config.client_id.clone()
        };

        let mut opts = MqttOptions::new(client_id, config.host.clone(), config.port);
        opts.set_keep_alive(Duration::from_secs(config.keep_alive));
        opts.set_clean_session(config.clean_session);
        opts.set_inflight(config.max_inflight);

        Ok(Self { opts, cap })
    }

    /// Sets the keep-alive interval in seconds.
    pub fn keep_alive(mut self, secs: u64) -> Self {
        self.opts.set_keep_alive(Duration::from_secs(secs));
        self
    }

    /// Requests (or not) a clean session from the broker.
    pub fn clean_session(mut self, clean: bool) -> Self {
        self.opts.set_clean_session(clean);
        self
    }

    /// Limits the number of unacknowledged QoS 1/2 publishes in flight.
    pub fn max_inflight(mut self, max: u16) -> Self {
        self.opts.set_inflight(max);
        self
    }

    /// Constructs the client and event loop.
    ///
    /// The connection is not established here; that happens when the event
    /// loop is polled.
    pub fn build(self) -> (AsyncClient, EventLoop) {
        AsyncClient::new(self.opts, self.cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_carries_capacity() {
        let builder = ClientBuilder::new("test_client", "localhost", 1883, 10);
        assert_eq!(builder.cap, 10);
    }

    #[test]
    fn build_returns_client_and_event_loop() {
        let (client, _event_loop) = ClientBuilder::new("test_client", "localhost", 1883, 10)
            .keep_alive(30)
            .clean_session(true)
            .max_inflight(20)
            .build();
        assert!(!format!("{:?}", client).is_empty());
    }

    #[test]
    fn from_config_accepts_valid_settings() {
        let config = Config {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "test_client".to_string(),
            keep_alive: 60,
            clean_session: true,
            max_inflight: 20,
        };

        let builder = ClientBuilder::from_config(&config, 10);
        assert!(builder.is_ok());
    }

    #[test]
    fn from_config_rejects_invalid_settings() {
        let config = Config {
            host: String::new(), // empty host fails validation
            ..Default::default()
        };

        let result = ClientBuilder::from_config(&config, 10);
        assert!(matches!(result, Err(TransferError::ConfigError(_))));
    }
}
