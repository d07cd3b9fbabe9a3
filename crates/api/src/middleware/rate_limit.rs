//! Per-owner booking-creation rate limiting.
//!
//! The primary limiter state is the `booking_request_log` table, so the limit
//! holds across processes and restarts. When the ledger is unreachable the
//! limiter degrades to an in-memory sliding window instead of failing open
//! entirely; that fallback is per-process and non-durable, which is the
//! accepted trade-off for keeping submissions flowing during a partial
//! database outage.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use pawhub_core::types::DbId;
use pawhub_db::repositories::RateLimitRepo;
use pawhub_db::DbPool;

/// Default maximum creation attempts per window.
const DEFAULT_MAX_REQUESTS: i64 = 5;

/// Default window length in seconds (10 minutes).
const DEFAULT_WINDOW_SECS: u64 = 600;

/// Booking-creation rate limit settings.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Attempts allowed per owner per window.
    pub max_requests: i64,
    /// Sliding window length.
    pub window: Duration,
}

impl RateLimitConfig {
    /// Load rate limit settings from environment variables.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `RATE_LIMIT_MAX_REQUESTS` | `5`     |
    /// | `RATE_LIMIT_WINDOW_SECS`  | `600`   |
    pub fn from_env() -> Self {
        let max_requests: i64 = std::env::var("RATE_LIMIT_MAX_REQUESTS")
            .unwrap_or_else(|_| DEFAULT_MAX_REQUESTS.to_string())
            .parse()
            .expect("RATE_LIMIT_MAX_REQUESTS must be a valid i64");

        let window_secs: u64 = std::env::var("RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| DEFAULT_WINDOW_SECS.to_string())
            .parse()
            .expect("RATE_LIMIT_WINDOW_SECS must be a valid u64");

        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

/// Sliding-window rate limiter for booking creation.
pub struct BookingRateLimiter {
    config: RateLimitConfig,
    /// In-memory fallback state: recent attempt instants per owner.
    fallback: Mutex<HashMap<DbId, Vec<Instant>>>,
}

impl BookingRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            fallback: Mutex::new(HashMap::new()),
        }
    }

    /// Record one creation attempt for the owner and decide whether it may
    /// proceed. The attempt is counted whether or not it is allowed, so a
    /// client hammering the endpoint keeps its window full.
    pub async fn check(&self, pool: &DbPool, owner_id: DbId) -> RateDecision {
        let window = chrono::Duration::from_std(self.config.window)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_WINDOW_SECS as i64));
        let window_start = chrono::Utc::now() - window;

        match RateLimitRepo::record_and_count(pool, owner_id, window_start).await {
            Ok(count) if count <= self.config.max_requests => RateDecision::Allowed,
            Ok(count) => {
                tracing::warn!(owner_id, count, "Booking creation rate limited");
                RateDecision::Limited {
                    retry_after_secs: self.config.window.as_secs(),
                }
            }
            Err(e) => {
                tracing::warn!(owner_id, error = %e,
                    "Rate-limit ledger unavailable, using in-memory fallback");
                self.check_fallback(owner_id)
            }
        }
    }

    /// In-memory sliding window used when the ledger is unreachable.
    fn check_fallback(&self, owner_id: DbId) -> RateDecision {
        let now = Instant::now();
        let mut state = self.fallback.lock().unwrap_or_else(|e| e.into_inner());
        let attempts = state.entry(owner_id).or_default();
        attempts.retain(|t| now.duration_since(*t) < self.config.window);
        attempts.push(now);

        if attempts.len() as i64 <= self.config.max_requests {
            RateDecision::Allowed
        } else {
            RateDecision::Limited {
                retry_after_secs: self.config.window.as_secs(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: i64, window_secs: u64) -> BookingRateLimiter {
        BookingRateLimiter::new(RateLimitConfig {
            max_requests: max,
            window: Duration::from_secs(window_secs),
        })
    }

    #[test]
    fn fallback_allows_up_to_the_ceiling() {
        let limiter = limiter(3, 60);
        for _ in 0..3 {
            assert_eq!(limiter.check_fallback(1), RateDecision::Allowed);
        }
        assert_eq!(
            limiter.check_fallback(1),
            RateDecision::Limited {
                retry_after_secs: 60
            }
        );
    }

    #[test]
    fn fallback_windows_are_per_owner() {
        let limiter = limiter(1, 60);
        assert_eq!(limiter.check_fallback(1), RateDecision::Allowed);
        assert_eq!(limiter.check_fallback(2), RateDecision::Allowed);
        assert!(matches!(
            limiter.check_fallback(1),
            RateDecision::Limited { .. }
        ));
    }
}
