//! Circuit breaker for the monitoring loop

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{error, info};

pub struct CircuitBreaker {
    pub consecutive_errors: Arc<RwLock<u32>>,
    pub is_open: Arc<RwLock<bool>>,
    pub last_error_time: Arc<RwLock<Option<Instant>>>,
    pub max_consecutive_errors: u32,
    pub cooldown_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(max_consecutive_errors: u32, cooldown_secs: u64) -> Self {
        Self {
            consecutive_errors: Arc::new(RwLock::new(0)),
            is_open: Arc::new(RwLock::new(false)),
            last_error_time: Arc::new(RwLock::new(None)),
            max_consecutive_errors: max_consecutive_errors.max(1),
            cooldown_duration: Duration::from_secs(cooldown_secs),
        }
    }

    pub async fn record_success(&self) {
        *self.consecutive_errors.write().await = 0;
        *self.is_open.write().await = false;
    }

    /// Returns true when this error tripped the breaker.
    pub async fn record_error(&self) -> bool {
        let mut errors = self.consecutive_errors.write().await;
        *errors += 1;

        if *errors >= self.max_consecutive_errors {
            let mut open = self.is_open.write().await;
            let newly_opened = !*open;
            *open = true;
            *self.last_error_time.write().await = Some(Instant::now());
            if newly_opened {
                error!("Circuit breaker OPEN after {} consecutive errors", *errors);
            }
            return newly_opened;
        }
        false
    }

    pub async fn can_proceed(&self) -> bool {
        if !*self.is_open.read().await {
            return true;
        }

        if let Some(last_error) = *self.last_error_time.read().await {
            if last_error.elapsed() > self.cooldown_duration {
                info!("Circuit breaker cooldown complete, resetting");
                *self.is_open.write().await = false;
                *self.consecutive_errors.write().await = 0;
                return true;
            }
        }
        false
    }

    pub async fn cooldown_remaining(&self) -> Duration {
        match *self.last_error_time.read().await {
            Some(last) if *self.is_open.read().await => {
                self.cooldown_duration.saturating_sub(last.elapsed())
            }
            _ => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_after_threshold_and_resets_on_success() {
        let breaker = CircuitBreaker::new(2, 60);
        assert!(!breaker.record_error().await);
        assert!(breaker.record_error().await);
        assert!(!breaker.can_proceed().await);
        assert!(breaker.cooldown_remaining().await > Duration::ZERO);

        breaker.record_success().await;
        assert!(breaker.can_proceed().await);
    }

    #[tokio::test]
    async fn zero_cooldown_closes_immediately() {
        let breaker = CircuitBreaker::new(1, 0);
        assert!(breaker.record_error().await);
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(breaker.can_proceed().await);
    }
}
