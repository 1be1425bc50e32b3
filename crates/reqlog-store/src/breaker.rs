//! Circuit breaker suppressing store access after a connectivity outage.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::warn;

/// Suppresses store access for a cooldown window after a detected
/// connection-level failure, so an unreachable store is not hammered with
/// a round-trip attempt on every request.
///
/// Any successful store call closes the breaker early.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Length of the suppression window.
    cooldown: Duration,
    /// When set, store access is suppressed until this instant.
    open_until: Mutex<Option<Instant>>,
}

impl CircuitBreaker {
    /// Create a breaker with the given cooldown window.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            open_until: Mutex::new(None),
        }
    }

    /// Whether store access is currently suppressed.
    pub fn is_open(&self) -> bool {
        let mut open_until = self.open_until.lock().expect("breaker lock");
        match *open_until {
            Some(until) if Instant::now() < until => true,
            Some(_) => {
                // Cooldown elapsed; allow the next attempt through.
                *open_until = None;
                false
            }
            None => false,
        }
    }

    /// Open the breaker for one cooldown window.
    pub fn trip(&self) {
        let until = Instant::now() + self.cooldown;
        *self.open_until.lock().expect("breaker lock") = Some(until);
        warn!(
            cooldown_seconds = self.cooldown.as_secs(),
            "Store unreachable, suppressing store access for the cooldown window"
        );
    }

    /// Close the breaker after a successful store call.
    pub fn record_success(&self) {
        *self.open_until.lock().expect("breaker lock") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_by_default() {
        let breaker = CircuitBreaker::new(Duration::from_secs(300));
        assert!(!breaker.is_open());
    }

    #[test]
    fn test_trip_opens_and_success_closes() {
        let breaker = CircuitBreaker::new(Duration::from_secs(300));
        breaker.trip();
        assert!(breaker.is_open());
        breaker.record_success();
        assert!(!breaker.is_open());
    }

    #[test]
    fn test_zero_cooldown_expires_immediately() {
        let breaker = CircuitBreaker::new(Duration::ZERO);
        breaker.trip();
        assert!(!breaker.is_open());
    }
}
