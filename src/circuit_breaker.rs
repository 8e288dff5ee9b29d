//! # Circuit Breaker Module
//!
//! This module implements the circuit breaker pattern for the external
//! ingredient classifier. After repeated failures the remote service is not
//! called again until the reset window has elapsed, so an outage costs at
//! most a few timeouts per window instead of one per ingredient.

use log::{info, warn};
use std::time::{Duration, Instant};

use crate::config::RecoveryConfig;

/// Circuit breaker for calls to the external classifier
///
/// # State Machine
///
/// - **Closed**: Normal operation, requests pass through
/// - **Open**: Failure threshold reached, requests are skipped
/// - **Half-Open**: Reset window elapsed, the next request is attempted
///
/// # Configuration
///
/// Uses `RecoveryConfig` for:
/// - `circuit_breaker_threshold`: Failures before opening (default: 3)
/// - `circuit_breaker_reset_secs`: Time before attempting reset (default: 300s)
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_count: u32,
    last_failure_time: Option<Instant>,
    config: RecoveryConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given configuration
    ///
    /// # Examples
    ///
    /// ```rust
    /// use menu_planner::config::RecoveryConfig;
    /// use menu_planner::circuit_breaker::CircuitBreaker;
    ///
    /// let mut breaker = CircuitBreaker::new(RecoveryConfig::default());
    /// assert!(!breaker.is_open());
    /// ```
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            failure_count: 0,
            last_failure_time: None,
            config,
        }
    }

    /// Check if the breaker is open (calls should be skipped)
    ///
    /// Resets to closed once the reset window has elapsed.
    pub fn is_open(&mut self) -> bool {
        if self.failure_count < self.config.circuit_breaker_threshold {
            return false;
        }

        if let Some(last_time) = self.last_failure_time {
            let window = Duration::from_secs(self.config.circuit_breaker_reset_secs);
            if last_time.elapsed() < window {
                return true;
            }
        }

        info!("Circuit breaker reset window elapsed, allowing calls again");
        self.failure_count = 0;
        self.last_failure_time = None;
        false
    }

    /// Record a failed call
    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        self.last_failure_time = Some(Instant::now());

        if self.failure_count == self.config.circuit_breaker_threshold {
            warn!(
                "Circuit breaker opened after {} consecutive failures",
                self.failure_count
            );
        }
    }

    /// Record a successful call, closing the breaker
    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.last_failure_time = None;
    }

    /// Current consecutive failure count
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: u32, reset_secs: u64) -> RecoveryConfig {
        RecoveryConfig {
            circuit_breaker_threshold: threshold,
            circuit_breaker_reset_secs: reset_secs,
        }
    }

    #[test]
    fn test_opens_after_threshold() {
        let mut breaker = CircuitBreaker::new(config(2, 300));
        breaker.record_failure();
        assert!(!breaker.is_open());
        breaker.record_failure();
        assert!(breaker.is_open());
    }

    #[test]
    fn test_success_closes() {
        let mut breaker = CircuitBreaker::new(config(1, 300));
        breaker.record_failure();
        assert!(breaker.is_open());
        breaker.record_success();
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn test_resets_after_window() {
        let mut breaker = CircuitBreaker::new(config(1, 0));
        breaker.record_failure();
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }
}
