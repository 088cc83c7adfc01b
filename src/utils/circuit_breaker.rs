use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::retry::IsTransient;

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Guards calls to an upstream service. After `failure_threshold` consecutive
// transient failures the breaker opens and rejects calls without running them; once
// `cool_down` has passed it lets calls through again (half-open) and closes
// after `success_threshold` successes in a row. Permanent errors (bad
// credentials, rejected queries) pass through without counting.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "Closed",
            CircuitState::Open => "Open",
            CircuitState::HalfOpen => "HalfOpen",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub cool_down: Duration,
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

struct Counters {
    state: CircuitState,
    failures: u32,
    successes: u32,
    opened_at: Option<Instant>,
}

#[derive(Clone)]
pub struct CircuitBreaker {
    counters: Arc<Mutex<Counters>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            counters: Arc::new(Mutex::new(Counters {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            })),
            config,
        }
    }

    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: IsTransient,
    {
        self.admit().await?;

        match operation.await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(err) => {
                if err.is_transient() {
                    self.on_failure().await;
                }
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    async fn admit<E>(&self) -> Result<(), CircuitBreakerError<E>> {
        let mut counters = self.counters.lock().await;

        if counters.state == CircuitState::Open {
            let cooled = counters
                .opened_at
                .is_some_and(|at| at.elapsed() >= self.config.cool_down);

            if !cooled {
                return Err(CircuitBreakerError::CircuitOpen);
            }

            tracing::info!("Circuit breaker half-open, probing upstream");
            counters.state = CircuitState::HalfOpen;
            counters.successes = 0;
        }

        Ok(())
    }

    async fn on_success(&self) {
        let mut counters = self.counters.lock().await;

        match counters.state {
            CircuitState::HalfOpen => {
                counters.successes += 1;
                if counters.successes >= self.config.success_threshold {
                    tracing::info!(successes = counters.successes, "Circuit breaker closed");
                    counters.state = CircuitState::Closed;
                    counters.failures = 0;
                    counters.successes = 0;
                    counters.opened_at = None;
                }
            }
            CircuitState::Closed => counters.failures = 0,
            CircuitState::Open => {}
        }
    }

    async fn on_failure(&self) {
        let mut counters = self.counters.lock().await;
        counters.failures += 1;

        match counters.state {
            CircuitState::Closed if counters.failures >= self.config.failure_threshold => {
                tracing::warn!(failures = counters.failures, "Circuit breaker opened");
                counters.state = CircuitState::Open;
                counters.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                tracing::warn!("Probe failed, circuit breaker re-opened");
                counters.state = CircuitState::Open;
                counters.successes = 0;
                counters.opened_at = Some(Instant::now());
            }
            _ => {}
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.counters.lock().await.state
    }
}
