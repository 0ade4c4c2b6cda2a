//! The periodic publisher.
//!
//! `PeriodicPublisher` owns a topic-bound publish handle and a recurring
//! timer; on each tick it formats a `"hello world <n>"` message with a
//! strictly increasing sequence counter, logs the emission, and hands the
//! text to the sink. It waits for transport readiness before the first tick
//! and stops ticking the moment its shutdown token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, sleep, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::readiness::Readiness;

/// Fixed prefix of every emitted message.
const MESSAGE_PREFIX: &str = "hello world";

/// Trait for sinks that can accept one outgoing text payload.
///
/// The sink is expected to be an O(1), non-blocking enqueue under normal
/// backlog conditions; delivery is entirely its own concern.
#[async_trait::async_trait]
pub trait MessageSink: Send + Sync {
    /// Submits one payload for publication.
    async fn submit(&self, payload: &str)
        -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// MQTT-backed sink: the topic-bound publish handle from `chatterd-mqtt`.
#[async_trait::async_trait]
impl MessageSink for chatterd_mqtt::Publisher {
    async fn submit(
        &self,
        payload: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.publish(payload).await.map_err(|e| Box::new(e) as _)
    }
}

/// Formats the message emitted on tick `seq`.
fn format_message(seq: u64) -> String {
    format!("{} {}", MESSAGE_PREFIX, seq)
}

/// Emits one counter message per timer tick on a fixed topic.
///
/// Two states: Armed (constructed, run loop accepting ticks) and Shutdown
/// (token cancelled, loop exited, resources dropped). The transition
/// happens exactly once; cancelling an already-cancelled token is a no-op.
pub struct PeriodicPublisher {
    /// Topic-bound publish handle; exclusively owned, dropped on loop exit.
    sink: Arc<dyn MessageSink>,

    /// Tick cadence.
    period: Duration,

    /// Transport readiness; the first tick waits for `Ready`.
    readiness: Readiness,

    /// Shutdown signal checked in the same select as the timer, so no tick
    /// is delivered after cancellation is observed.
    shutdown: CancellationToken,

    /// Sequence counter: starts at 0, incremented once per tick, never
    /// reset. Message n carries the value n - 1.
    seq: u64,
}

impl PeriodicPublisher {
    /// Creates an armed publisher. No side effects until [`Self::run`].
    pub fn new(sink: Arc<dyn MessageSink>, period: Duration, readiness: Readiness) -> Self {
        Self {
            sink,
            period,
            readiness,
            shutdown: CancellationToken::new(),
            seq: 0,
        }
    }

    /// Returns the token that stops the run loop when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the publish loop until shutdown.
    ///
    /// Waits for transport readiness, then emits one message per period.
    /// Consumes the publisher: when this returns, the timer and the sink
    /// handle are released together.
    pub async fn run(mut self) {
        if !self.wait_until_ready().await {
            return;
        }

        info!(
            "Periodic publishing started (period: {} ms)",
            self.period.as_millis()
        );

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Publisher shut down after {} messages", self.seq);
                    break;
                }
                _ = ticker.tick() => self.on_tick().await,
            }
        }
    }

    /// Emits a single message: format, log, submit, advance the counter.
    async fn on_tick(&mut self) {
        let message = format_message(self.seq);
        info!("Publishing: {}", message);

        // Fire-and-forget: delivery failures are the transport's concern.
        if let Err(e) = self.sink.submit(&message).await {
            debug!("Transport did not accept message: {}", e);
        }

        self.seq += 1;
    }

    /// Blocks until the transport reports `Ready`.
    ///
    /// Returns false when shutdown was requested (or the readiness channel
    /// closed) before readiness was reached — the run loop must not start.
    async fn wait_until_ready(&self) -> bool {
        let mut rx = self.readiness.subscribe();
        if rx.borrow().is_ready() {
            info!("Transport is already ready — starting to publish");
            return true;
        }

        warn!("Waiting for transport readiness... Current: {}", *rx.borrow());
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown requested before the first tick");
                    return false;
                }
                changed = rx.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                    let state = rx.borrow().clone();
                    if state.is_ready() {
                        info!("Transport is READY! Starting to publish");
                        return true;
                    }
                    warn!("Still not ready: {}", state);
                }
                _ = sleep(Duration::from_secs(30)) => {
                    warn!(
                        "Still waiting for transport readiness... Current: {}",
                        *rx.borrow()
                    );
                }
            }
        }
    }
}
