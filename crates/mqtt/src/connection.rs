//! Connection supervision: event loop driving, reconnection, state tracking.
//!
//! `ConnectionKernel` is the heart of the transport. It polls the rumqttc
//! event loop, classifies failures as fatal or recoverable, sleeps out an
//! exponential backoff between reconnection attempts, and broadcasts every
//! state transition over a watch channel.
//!
//! The kernel runs on a single tokio task; the `AsyncClient` handle stays
//! usable from any other task while the kernel runs.

use rumqttc::{AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, Packet};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::{backoff::Backoff, error::TransferError, state::ConnectionState};

/// Drives the MQTT event loop and owns the reconnect policy.
pub struct ConnectionKernel {
    /// Client handle, used to send the final DISCONNECT on shutdown.
    client: AsyncClient,

    /// Event loop receiving broker packets and connection errors.
    event_loop: EventLoop,

    /// Retry schedule applied between reconnection attempts.
    backoff: Backoff,

    /// Shutdown signal; when cancelled the kernel disconnects and returns.
    cancel: CancellationToken,

    state_tx: watch::Sender<ConnectionState>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ConnectionKernel {
    /// Creates a kernel around a freshly built client/event loop pair.
    ///
    /// The initial broadcast state is `Connecting`; nothing happens on the
    /// network until [`ConnectionKernel::run`] is polled.
    pub fn new(client: AsyncClient, event_loop: EventLoop, cancel: CancellationToken) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        Self {
            client,
            event_loop,
            backoff: Backoff::default(),
            cancel,
            state_tx,
            state_rx,
        }
    }

    /// Returns a receiver observing connection state transitions.
    ///
    /// The receiver sees the current state immediately and every change
    /// afterwards.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Broadcasts a state change; transitions to the current state are
    /// suppressed.
    fn update_state(&self, state: ConnectionState) {
        let changed = *self.state_tx.borrow() != state;
        if changed {
            info!("Connection state changed to: {}", state);
            if self.state_tx.send(state).is_err() {
                warn!("No subscribers for connection state updates");
            }
        }
    }

    /// Runs the supervision loop until shutdown or a fatal condition.
    ///
    /// Behavior per outcome of each event-loop poll:
    ///
    /// - **Event received**: handled by [`Self::handle_event`]; a CONNACK
    ///   resets the backoff schedule and broadcasts `Connected`.
    /// - **Recoverable error**: broadcast `Reconnecting(delay)`, sleep the
    ///   backoff delay, poll again.
    /// - **Fatal error** (bad credentials, protocol violation, local
    ///   misconfiguration): broadcast `Disconnected` and return the error.
    /// - **Backoff exhausted**: broadcast `Disconnected` and return
    ///   `TransferError::RetriesPolicy`.
    /// - **Cancellation**: best-effort DISCONNECT, then return `Ok(())`.
    pub async fn run(&mut self) -> Result<(), TransferError> {
        self.update_state(ConnectionState::Connecting);
        self.backoff.reset();

        info!("Starting connection event loop...");
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Shutdown signal received, closing connection...");
                    self.disconnect().await;
                    info!("Connection kernel shutdown completed");
                    return Ok(());
                }

                event_result = self.event_loop.poll() => {
                    match event_result {
                        Ok(event) => self.handle_event(event),
                        Err(e) => {
                            if is_fatal_error(&e) {
                                error!("Fatal connection error, giving up: {}", get_error_message(&e));
                                self.update_state(ConnectionState::Disconnected(e.to_string()));
                                return Err(TransferError::from(e));
                            }

                            match self.backoff.next_sleep() {
                                Ok(delay) => {
                                    warn!(
                                        "Reconnecting in {:.2} seconds due to error: {}",
                                        delay.as_secs_f64(),
                                        get_error_message(&e)
                                    );
                                    self.update_state(ConnectionState::Reconnecting(delay.as_secs_f64()));
                                    tokio::time::sleep(delay).await;
                                    self.update_state(ConnectionState::Connecting);
                                }
                                Err(backoff_err) => {
                                    error!("Maximum reconnect attempts exceeded: {}", backoff_err);
                                    self.update_state(ConnectionState::Disconnected(backoff_err.to_string()));
                                    return Err(TransferError::RetriesPolicy(backoff_err));
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Updates connection state from a single protocol event.
    ///
    /// Only CONNACK and DISCONNECT matter here; everything else is either
    /// handled transparently by rumqttc (pings, acks) or irrelevant to a
    /// publish-only client.
    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Incoming(packet) => match packet {
                Packet::ConnAck(conn_ack) => {
                    if conn_ack.code == ConnectReturnCode::Success {
                        info!("Connection established successfully.");
                        self.update_state(ConnectionState::Connected);
                        self.backoff.reset();
                    }
                }
                Packet::Disconnect => {
                    warn!("Disconnected by broker");
                    self.update_state(ConnectionState::Disconnected(
                        "Disconnected by broker".into(),
                    ));
                }
                other => {
                    trace!("Incoming packet: {:?}", other);
                }
            },
            Event::Outgoing(outgoing) => {
                trace!("Outgoing packet: {:?}", outgoing);
            }
        }
    }

    /// Sends a DISCONNECT packet, best-effort: the connection is going away
    /// regardless.
    async fn disconnect(&mut self) {
        if let Err(e) = self.client.disconnect().await {
            debug!("Error sending disconnect packet: {:?}", e);
        }
    }

    /// Returns the next backoff delay, advancing the schedule. Exposed for
    /// tests.
    #[cfg(test)]
    fn next_retry_delay(&mut self) -> Result<std::time::Duration, TransferError> {
        self.backoff
            .next_sleep()
            .map_err(TransferError::RetriesPolicy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    /// Unrecoverable; reconnecting cannot help.
    Fatal,
    /// Temporary; a reconnect attempt is reasonable.
    Reconnect,
}

fn classify_connection_error(err: &ConnectionError) -> Disposition {
    use Disposition::*;

    match err {
        // Broken crypto setup or certificates; retrying reproduces it.
        ConnectionError::Tls(_) => Fatal,

        // Protocol-level corruption or violation.
        ConnectionError::MqttState(_) => Fatal,
        ConnectionError::NotConnAck(_) => Fatal,

        // The request stream is closed; the connection cannot be reused.
        ConnectionError::RequestsDone => Fatal,

        // I/O errors: local misconfiguration is fatal, the rest transient.
        ConnectionError::Io(e) => match e.kind() {
            std::io::ErrorKind::AddrInUse
            | std::io::ErrorKind::PermissionDenied
            | std::io::ErrorKind::InvalidInput
            | std::io::ErrorKind::InvalidData => Fatal,
            _ => Reconnect,
        },

        ConnectionError::NetworkTimeout | ConnectionError::FlushTimeout => Reconnect,

        // Broker refused the connection; only some refusals are permanent.
        ConnectionError::ConnectionRefused(code) => match code {
            ConnectReturnCode::RefusedProtocolVersion
            | ConnectReturnCode::BadClientId
            | ConnectReturnCode::BadUserNamePassword
            | ConnectReturnCode::NotAuthorized => Fatal,
            ConnectReturnCode::ServiceUnavailable => Reconnect,
            _ => Reconnect,
        },

        // Unknown or future variants: prefer reconnecting over hard failure.
        #[allow(unreachable_patterns)]
        _ => Reconnect,
    }
}

fn is_fatal_error(err: &ConnectionError) -> bool {
    matches!(classify_connection_error(err), Disposition::Fatal)
}

/// Innermost message of an error chain, with surrounding quotes stripped.
fn get_error_message(e: &dyn std::error::Error) -> String {
    let mut current = e;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string().trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::ClientBuilder;

    fn test_kernel() -> ConnectionKernel {
        let (client, event_loop) = ClientBuilder::new("test_kernel", "localhost", 1883, 10).build();
        ConnectionKernel::new(client, event_loop, CancellationToken::new())
    }

    #[tokio::test]
    async fn initial_state_is_connecting() {
        let kernel = test_kernel();
        let state_rx = kernel.subscribe_state();
        assert_eq!(*state_rx.borrow(), ConnectionState::Connecting);
    }

    #[tokio::test]
    async fn state_updates_reach_subscribers() {
        let kernel = test_kernel();
        let mut state_rx = kernel.subscribe_state();

        kernel.update_state(ConnectionState::Connected);

        state_rx.changed().await.unwrap();
        assert_eq!(*state_rx.borrow(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn repeated_state_is_not_rebroadcast() {
        let kernel = test_kernel();
        let state_rx = kernel.subscribe_state();

        kernel.update_state(ConnectionState::Connecting);
        assert!(!state_rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn retry_delays_come_from_backoff() {
        let mut kernel = test_kernel();

        let first = kernel.next_retry_delay().unwrap();
        assert!(first >= Duration::from_secs(1));

        let second = kernel.next_retry_delay().unwrap();
        assert!(second >= first);
    }

    #[tokio::test]
    async fn cancelled_kernel_returns_ok() {
        let mut kernel = test_kernel();
        let cancel = kernel.cancel.clone();
        cancel.cancel();

        // With the token already cancelled the loop must exit immediately
        // without touching the network.
        let result = kernel.run().await;
        assert!(result.is_ok());
    }

    #[test]
    fn io_error_classification() {
        use std::io;

        let transient = ConnectionError::Io(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(!is_fatal_error(&transient));

        let fatal =
            ConnectionError::Io(io::Error::new(io::ErrorKind::AddrInUse, "address in use"));
        assert!(is_fatal_error(&fatal));

        let fatal = ConnectionError::Io(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "permission denied",
        ));
        assert!(is_fatal_error(&fatal));
    }

    #[test]
    fn timeouts_are_recoverable() {
        assert!(!is_fatal_error(&ConnectionError::NetworkTimeout));
        assert!(!is_fatal_error(&ConnectionError::FlushTimeout));
    }

    #[test]
    fn refused_credentials_are_fatal() {
        let err = ConnectionError::ConnectionRefused(ConnectReturnCode::BadUserNamePassword);
        assert!(is_fatal_error(&err));

        let err = ConnectionError::ConnectionRefused(ConnectReturnCode::ServiceUnavailable);
        assert!(!is_fatal_error(&err));
    }
}
