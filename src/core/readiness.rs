//! Readiness state management for the application.
//!
//! Readiness tracks whether the process is in a position to do its real
//! work — here, whether the MQTT transport has a live broker connection.
//! The periodic publisher subscribes to readiness changes and holds its
//! first tick until the state reports `Ready`.

use std::fmt;

use chatterd_mqtt::ConnectionState;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Represents the current readiness state of the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessState {
    /// The system is fully operational and ready to publish.
    Ready,
    /// The system is not ready; the string describes the cause.
    NotReadyYet(String),
    /// The readiness state has not yet been determined.
    Unknown,
}

impl ReadinessState {
    /// Returns true if the system is ready.
    pub fn is_ready(&self) -> bool {
        matches!(self, ReadinessState::Ready)
    }

    /// Returns the reason string if the state is `NotReadyYet`, otherwise an
    /// empty string.
    pub fn reason(&self) -> &str {
        match self {
            ReadinessState::NotReadyYet(reason) => reason,
            _ => "",
        }
    }
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessState::Ready => write!(f, "Ready"),
            ReadinessState::NotReadyYet(reason) => write!(f, "NotReadyYet: {}", reason),
            ReadinessState::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Shared readiness tracker observable by multiple components.
#[derive(Debug, Clone)]
pub struct Readiness {
    state_tx: watch::Sender<ReadinessState>,
    state_rx: watch::Receiver<ReadinessState>,
}

impl Readiness {
    /// Creates a tracker with an initial `Unknown` state.
    pub fn new() -> Self {
        let (state_tx, state_rx) = watch::channel(ReadinessState::Unknown);
        Self { state_tx, state_rx }
    }

    /// Returns a receiver for subscribing to readiness changes.
    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.state_rx.clone()
    }

    /// Returns the current readiness state without subscribing.
    pub fn current_state(&self) -> ReadinessState {
        self.state_rx.borrow().clone()
    }

    /// Manually updates the readiness state.
    pub fn set_state(&self, state: ReadinessState) {
        let old_state = self.state_rx.borrow().clone();
        let _ = self.state_tx.send(state.clone());
        debug!("Readiness state changed: {} -> {}", old_state, state);
    }

    /// Spawns a task translating MQTT connection state into readiness.
    pub async fn start_listening(&self, connection_state_rx: watch::Receiver<ConnectionState>) {
        let state_tx = self.state_tx.clone();
        tokio::spawn(async move {
            listen(connection_state_rx, state_tx).await;
        });
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

/// Mirrors MQTT connection state changes into the readiness channel until
/// either side closes.
async fn listen(
    mut connection_state_rx: watch::Receiver<ConnectionState>,
    state_tx: watch::Sender<ReadinessState>,
) {
    debug!("Launching transport connection state listener");

    // Publish the readiness view of the current state before waiting for
    // changes, so late subscribers never observe a stale Unknown.
    {
        let conn_state = connection_state_rx.borrow().clone();
        let readiness_state = adapt_connection_state(&conn_state);
        debug!("Initial transport state: {}", conn_state);
        let _ = state_tx.send(readiness_state);
    }

    while connection_state_rx.changed().await.is_ok() {
        let conn_state = connection_state_rx.borrow().clone();
        let readiness_state = adapt_connection_state(&conn_state);
        debug!(
            "Transition: transport {} -> readiness {}",
            conn_state, readiness_state
        );

        if state_tx.send(readiness_state).is_err() {
            warn!("No subscribers to readiness state");
            break;
        }
    }

    debug!("Connection state channel closed, listener stopped");
}

/// Maps an MQTT connection state to the corresponding readiness state.
fn adapt_connection_state(state: &ConnectionState) -> ReadinessState {
    match state {
        ConnectionState::Connected => ReadinessState::Ready,
        ConnectionState::Disconnected(reason) => {
            ReadinessState::NotReadyYet(format!("Disconnected: {}", reason))
        }
        ConnectionState::Reconnecting(secs) => {
            ReadinessState::NotReadyYet(format!("Reconnecting in {:.1} sec", secs))
        }
        ConnectionState::Connecting => ReadinessState::NotReadyYet("Connecting...".to_string()),
    }
}
