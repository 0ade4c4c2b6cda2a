//! High-level assembly of the MQTT transport.
//!
//! `MqttManager` is the entry point for applications: it builds the client
//! and the connection kernel from configuration, spawns the kernel on its
//! own task, and hands back an [`MqttInstance`] exposing everything a
//! producer needs — the client handle, the connection-state receiver, and a
//! cancellation token for shutdown.
//!
//! # Typical Usage
//!
//! ```ignore
//! let manager = MqttManager::from_config(config, queue_depth)?;
//! let instance = manager.build_and_start().await?;
//!
//! let mut state_rx = instance.state_receiver();
//! // ... build a Publisher, watch state_rx, publish ...
//!
//! instance.cancel_token().cancel(); // graceful shutdown
//! ```

use rumqttc::AsyncClient;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{
    client::ClientBuilder,
    config::{Config, DEFAULT_QUEUE_DEPTH},
    connection::ConnectionKernel,
    error::TransferError,
    state::ConnectionState,
};

/// Builder of the transport infrastructure.
pub struct MqttManager {
    /// Broker connection settings.
    config: Config,

    /// Outgoing request channel capacity (the publisher queue depth).
    queue_depth: usize,

    /// Token that stops the connection kernel.
    cancel_token: CancellationToken,
}

impl MqttManager {
    /// Creates a manager from an existing configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::ConfigError` when the configuration violates
    /// a validation constraint.
    pub fn from_config(config: Config, queue_depth: usize) -> Result<Self, TransferError> {
        use validator::Validate;
        config.validate()?;

        Ok(Self {
            config,
            queue_depth,
            cancel_token: CancellationToken::new(),
        })
    }

    /// Creates a manager with default settings for the given broker address.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, TransferError> {
        let config = Config {
            host: host.into(),
            port,
            ..Default::default()
        };
        Self::from_config(config, DEFAULT_QUEUE_DEPTH)
    }

    /// Builds the client and connection kernel and starts supervision.
    ///
    /// The kernel task runs until the cancellation token fires or a fatal
    /// connection error occurs; the actual broker connection is established
    /// asynchronously after this returns. Observe readiness through
    /// [`MqttInstance::state_receiver`].
    ///
    /// # Errors
    ///
    /// Returns `TransferError::ConfigError` if client construction rejects
    /// the configuration. This is a Fatal-Construction failure: the caller
    /// cannot proceed without a transport.
    pub async fn build_and_start(self) -> Result<MqttInstance, TransferError> {
        info!(
            "Building MQTT transport for {}:{} (queue depth: {})",
            self.config.host, self.config.port, self.queue_depth
        );

        let (client, event_loop) = ClientBuilder::from_config(&self.config, self.queue_depth)?.build();

        let mut kernel = ConnectionKernel::new(client.clone(), event_loop, self.cancel_token.clone());
        let state_rx = kernel.subscribe_state();

        tokio::spawn(async move {
            if let Err(e) = kernel.run().await {
                error!("MQTT connection kernel exited with error: {}", e);
            }
        });

        info!("MQTT transport built successfully");

        Ok(MqttInstance {
            client,
            state_rx,
            cancel_token: self.cancel_token,
        })
    }

    /// Gets a reference to the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Gets a clone of the cancellation token, usable to trigger shutdown
    /// from anywhere in the application.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}

/// A running MQTT transport.
///
/// Cloneable; all clones share the same client, state channel and
/// cancellation token.
#[derive(Debug, Clone)]
pub struct MqttInstance {
    client: AsyncClient,
    state_rx: watch::Receiver<ConnectionState>,
    cancel_token: CancellationToken,
}

impl MqttInstance {
    /// The thread-safe client handle used to enqueue publishes.
    pub fn client(&self) -> &AsyncClient {
        &self.client
    }

    /// A receiver observing connection state transitions.
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Current connection state without subscribing.
    pub fn current_state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    /// The cancellation token shared with the connection kernel.
    ///
    /// Cancelling it makes the kernel send a best-effort DISCONNECT and
    /// exit; cancelling more than once is a no-op.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}
