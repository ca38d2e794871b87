//! In-memory rate limiting for the person methods.
//!
//! DESIGN
//! ======
//! Sliding-window counters backed by `HashMap<Uuid, VecDeque<Instant>>`.
//! One limit is enforced: at most 5 method invocations per 1000ms window,
//! per connection, shared across `person.insert` and `people.remove`.
//!
//! The connection key is derived by the route layer (hash of the session
//! cookie); the limiter itself only sees opaque UUIDs.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

const DEFAULT_METHOD_LIMIT: usize = 5;
const DEFAULT_METHOD_WINDOW_MS: u64 = 1000;

#[derive(Clone, Copy)]
struct RateLimitConfig {
    method_limit: usize,
    method_window: Duration,
}

impl RateLimitConfig {
    fn from_env() -> Self {
        let window_ms = env_parse("METHOD_RATE_WINDOW_MS", DEFAULT_METHOD_WINDOW_MS);
        Self {
            method_limit: env_parse("METHOD_RATE_LIMIT", DEFAULT_METHOD_LIMIT),
            method_window: Duration::from_millis(window_ms),
        }
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("method rate limit exceeded (max {limit} calls/{window_ms}ms)")]
    MethodExceeded { limit: usize, window_ms: u64 },
}

// =============================================================================
// RATE LIMITER
// =============================================================================

#[derive(Clone)]
pub struct RateLimiter {
    inner: std::sync::Arc<Mutex<RateLimiterInner>>,
    config: RateLimitConfig,
}

struct RateLimiterInner {
    /// Per-connection invocation timestamps.
    connection_calls: HashMap<Uuid, VecDeque<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: std::sync::Arc::new(Mutex::new(RateLimiterInner { connection_calls: HashMap::new() })),
            config: RateLimitConfig::from_env(),
        }
    }

    /// Check the per-connection limit, then record the invocation.
    pub fn check_and_record(&self, connection_id: Uuid) -> Result<(), RateLimitError> {
        self.check_and_record_at(connection_id, Instant::now())
    }

    /// Internal: check + record with explicit timestamp (for testing).
    fn check_and_record_at(&self, connection_id: Uuid, now: Instant) -> Result<(), RateLimitError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let cfg = self.config;

        let deque = inner.connection_calls.entry(connection_id).or_default();
        prune_window(deque, now, cfg.method_window);
        if deque.len() >= cfg.method_limit {
            return Err(RateLimitError::MethodExceeded {
                limit: cfg.method_limit,
                window_ms: u64::try_from(cfg.method_window.as_millis()).unwrap_or(u64::MAX),
            });
        }

        deque.push_back(now);
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn prune_window(deque: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&front) = deque.front() {
        if now.duration_since(front) > window {
            deque.pop_front();
        } else {
            break;
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "rate_limit_test.rs"]
mod tests;
