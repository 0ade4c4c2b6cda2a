//! Observable connection state for MQTT clients.
//!
//! The connection kernel broadcasts a `ConnectionState` over a watch channel
//! so that other components can react to connectivity changes — typically by
//! holding back publishes until the broker is reachable.

use std::fmt;

/// Current state of the MQTT connection.
///
/// Lifecycle: `Connecting -> Connected`, and on failure
/// `Disconnected -> Reconnecting(delay) -> Connecting -> ...` until the
/// broker accepts the connection again or the retry policy gives up.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// CONNECT sent, waiting for the broker's CONNACK.
    Connecting,

    /// Handshake complete, keep-alive active. The only state in which
    /// publishes actually leave the process.
    Connected,

    /// Connection lost; the string carries the reason (broker-initiated
    /// disconnect, network error, retry exhaustion).
    Disconnected(String),

    /// Waiting out a backoff delay before the next attempt; the field is the
    /// delay in seconds.
    Reconnecting(f64),
}

impl ConnectionState {
    /// Short static identifier for logging and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Connected => "Connected",
            ConnectionState::Disconnected(_) => "Disconnected",
            ConnectionState::Reconnecting(_) => "Reconnecting",
        }
    }

    /// Contextual details: the disconnect reason or the reconnect delay.
    /// Empty for `Connecting` and `Connected`.
    pub fn details(&self) -> String {
        match self {
            ConnectionState::Connecting | ConnectionState::Connected => String::new(),
            ConnectionState::Disconnected(reason) => reason.clone(),
            ConnectionState::Reconnecting(seconds) => format!("in {seconds} seconds"),
        }
    }

    /// True only in `Connected`, when publishes can reach the broker.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// True while the client is working towards a connection.
    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Reconnecting(_)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())?;
        let details = self.details();
        if !details.is_empty() {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_str_identifies_every_state() {
        assert_eq!(ConnectionState::Connecting.as_str(), "Connecting");
        assert_eq!(ConnectionState::Connected.as_str(), "Connected");
        assert_eq!(
            ConnectionState::Disconnected("gone".into()).as_str(),
            "Disconnected"
        );
        assert_eq!(ConnectionState::Reconnecting(1.0).as_str(), "Reconnecting");
    }

    #[test]
    fn details_carry_context() {
        assert_eq!(ConnectionState::Connected.details(), "");
        assert_eq!(
            ConnectionState::Disconnected("network error".into()).details(),
            "network error"
        );
        assert_eq!(
            ConnectionState::Reconnecting(3.5).details(),
            "in 3.5 seconds"
        );
    }

    #[test]
    fn display_combines_state_and_details() {
        assert_eq!(ConnectionState::Connected.to_string(), "Connected");
        assert_eq!(
            ConnectionState::Reconnecting(2.0).to_string(),
            "Reconnecting (in 2 seconds)"
        );
        assert_eq!(
            ConnectionState::Disconnected("broker closed".into()).to_string(),
            "Disconnected (broker closed)"
        );
    }

    #[test]
    fn connectivity_predicates() {
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Connecting.is_connected());

        assert!(ConnectionState::Connecting.is_connecting());
        assert!(ConnectionState::Reconnecting(1.0).is_connecting());
        assert!(!ConnectionState::Connected.is_connecting());
        assert!(!ConnectionState::Disconnected("err".into()).is_connecting());
    }
}
