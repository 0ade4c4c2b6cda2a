//! Exponential backoff for connection retries.
//!
//! On connection failure the kernel waits an increasing amount of time
//! between attempts instead of hammering a recovering broker:
//!
//! ```text
//! delay[n] = min(initial * multiplier^(n-1), max_delay)
//! ```
//!
//! With the defaults (initial 1s, multiplier 1.1, cap 60s) the schedule is
//! 1.0s, 1.1s, 1.21s, ... up to 60s. Once the schedule saturates at the cap
//! the controller reports exhaustion instead of retrying forever.

use std::time::Duration;

use thiserror::Error;

/// Raised when the retry budget is spent.
#[derive(Debug, Error)]
pub enum BackoffError {
    /// Maximum retry attempts exceeded; the field carries the effective
    /// limit (explicit or computed from the timing parameters).
    #[error("Maximum number of attempts exceeded: {0}")]
    MaxAttemptLimitError(u32),
}

/// Exponential backoff controller.
///
/// Each failed attempt advances the schedule; a successful connection should
/// call [`Backoff::reset`] so the next outage starts from the initial delay
/// again.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial_delay: Duration,
    current_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    attempt: u32,
    /// Explicit attempt cap; when unset, the computed saturation point is
    /// used instead.
    max_attempts: Option<u32>,
    calculated_max_attempts: u32,
}

impl Backoff {
    /// Creates a controller with custom timing parameters.
    ///
    /// Degenerate inputs (`initial >= max` or `multiplier <= 1.0`) collapse
    /// the schedule to a single attempt.
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        let calculated_max_attempts = Self::calculate_max_attempts(initial, max, multiplier);
        Self {
            initial_delay: initial,
            current_delay: initial,
            max_delay: max,
            multiplier,
            attempt: 0,
            max_attempts: None,
            calculated_max_attempts,
        }
    }

    /// Number of attempts until the delay plateaus at `max`.
    ///
    /// Solves `initial * multiplier^n = max` for n; retrying past that point
    /// would just repeat the capped delay.
    fn calculate_max_attempts(initial: Duration, max: Duration, multiplier: f64) -> u32 {
        if initial >= max || multiplier <= 1.0 {
            return 1;
        }

        let n = (max.as_secs_f64() / initial.as_secs_f64()).log(multiplier);
        n.floor() as u32 + 1
    }

    /// Overrides the computed attempt limit with a stricter one.
    pub fn set_max_attempts(&mut self, max: u32) {
        self.max_attempts = Some(max);
    }

    /// Returns the schedule to its initial state. Call on successful connect.
    pub fn reset(&mut self) {
        self.current_delay = self.initial_delay;
        self.attempt = 0;
    }

    /// Returns the delay to sleep before the next attempt and advances the
    /// schedule, or `BackoffError` once the attempt budget is spent.
    pub fn next_sleep(&mut self) -> Result<Duration, BackoffError> {
        self.attempt += 1;
        let effective_max = self.max_attempts.unwrap_or(self.calculated_max_attempts);

        if self.attempt > effective_max {
            return Err(BackoffError::MaxAttemptLimitError(effective_max));
        }

        let sleep = self.current_delay;

        let next_delay_secs = self.current_delay.as_secs_f64() * self.multiplier;
        self.current_delay = Duration::from_secs_f64(next_delay_secs).min(self.max_delay);

        Ok(sleep)
    }

    /// Configured maximum delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Count of attempts consumed so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempt limit computed from the timing parameters.
    pub fn calculated_max_attempts(&self) -> u32 {
        self.calculated_max_attempts
    }
}

impl Default for Backoff {
    /// Gentle defaults for broker reconnection: 1s initial delay, 10%
    /// growth per attempt, capped at 60s.
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 1.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_starts_at_initial_delay() {
        let backoff = Backoff::default();
        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.current_delay, Duration::from_secs(1));
        assert_eq!(backoff.max_delay(), Duration::from_secs(60));
    }

    #[test]
    fn delays_grow_monotonically() {
        let mut backoff = Backoff::default();

        let first = backoff.next_sleep().unwrap();
        assert_eq!(first, Duration::from_secs(1));

        let second = backoff.next_sleep().unwrap();
        assert!(second > first);
        assert!(second < Duration::from_secs_f64(1.2));
    }

    #[test]
    fn delay_is_capped_at_max() {
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(10), 2.0);

        let mut last = Duration::ZERO;
        while let Ok(delay) = backoff.next_sleep() {
            last = delay;
        }

        assert!(last <= Duration::from_secs(10));
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut backoff = Backoff::default();

        backoff.next_sleep().unwrap();
        backoff.next_sleep().unwrap();
        assert_eq!(backoff.attempt(), 2);

        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
        assert_eq!(backoff.next_sleep().unwrap(), Duration::from_secs(1));
    }

    #[test]
    fn explicit_limit_exhausts_schedule() {
        let mut backoff = Backoff::default();
        backoff.set_max_attempts(2);

        assert!(backoff.next_sleep().is_ok());
        assert!(backoff.next_sleep().is_ok());

        match backoff.next_sleep() {
            Err(BackoffError::MaxAttemptLimitError(max)) => assert_eq!(max, 2),
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn computed_limit_matches_saturation() {
        // With 1s initial, 60s cap and 10% growth the schedule saturates
        // somewhere in the tens of attempts.
        let backoff = Backoff::default();
        assert!(backoff.calculated_max_attempts() > 40);
        assert!(backoff.calculated_max_attempts() < 100);
    }

    #[test]
    fn degenerate_parameters_collapse_to_one_attempt() {
        let no_growth = Backoff::new(Duration::from_secs(1), Duration::from_secs(10), 0.9);
        assert_eq!(no_growth.calculated_max_attempts(), 1);

        let no_headroom = Backoff::new(Duration::from_secs(10), Duration::from_secs(10), 1.5);
        assert_eq!(no_headroom.calculated_max_attempts(), 1);
    }
}
