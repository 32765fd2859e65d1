//! Rate limiting
//!
//! Two mechanisms live here:
//! - `RateLimitState` / `RateLimitPolicy`: the provider's token bucket as
//!   advertised by `X-RateLimit-*` response headers, and the wait derived from it.
//! - `RateLimiter`: an optional client-side token bucket (governor) that caps
//!   the request rate before the provider ever has to push back.

use chrono::{DateTime, TimeZone, Utc};
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use reqwest::header::HeaderMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Header with the bucket size
pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Header with the requests left in the current window
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Header with the window reset time (unix seconds)
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

// ============================================================================
// Provider-advertised bucket
// ============================================================================

/// Rate-limit bucket as last observed in response headers
///
/// Every field is optional; a missing or unparsable header means "unknown".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Bucket size
    pub limit: Option<u32>,
    /// Requests left before the window resets
    pub remaining: Option<u32>,
    /// When the window resets
    pub reset: Option<DateTime<Utc>>,
}

impl RateLimitState {
    /// Parse the state from response headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
        }

        Self {
            limit: header(headers, RATE_LIMIT_LIMIT_HEADER),
            remaining: header(headers, RATE_LIMIT_REMAINING_HEADER),
            reset: header::<i64>(headers, RATE_LIMIT_RESET_HEADER)
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }
}

impl std::fmt::Display for RateLimitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: Option<u32>| v.map_or_else(|| "?".to_string(), |v| v.to_string());
        write!(f, "{}/{}", show(self.remaining), show(self.limit))?;
        if let Some(reset) = self.reset {
            write!(f, " (reset {})", reset.format("%H:%M:%S"))?;
        }
        Ok(())
    }
}

/// Wait before the next page given the advertised bucket
///
/// Zero unless `remaining == 0`; otherwise `max(0, (reset_at - now) * fraction)`.
pub fn pacing_delay(
    remaining: u32,
    reset_at: DateTime<Utc>,
    now: DateTime<Utc>,
    fraction: f64,
) -> Duration {
    if remaining != 0 {
        return Duration::ZERO;
    }
    let window_ms = (reset_at - now).num_milliseconds();
    if window_ms <= 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(window_ms as f64 / 1000.0 * fraction)
}

/// Pacing policy applied between pages
///
/// The provider refills the bucket linearly over the window, so waiting for a
/// fraction of the remaining window trades throughput against another 429.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimitPolicy {
    /// Fraction of the remaining window to wait once the bucket is empty
    pub replenish_fraction: f64,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            replenish_fraction: 0.5,
        }
    }
}

impl RateLimitPolicy {
    /// Create a policy with a custom fraction
    pub fn new(replenish_fraction: f64) -> Self {
        Self { replenish_fraction }
    }

    /// Wait required before the next page; zero when the state is unknown
    pub fn wait_for(&self, state: &RateLimitState, now: DateTime<Utc>) -> Duration {
        match (state.remaining, state.reset) {
            (Some(remaining), Some(reset)) => {
                pacing_delay(remaining, reset, now, self.replenish_fraction)
            }
            _ => Duration::ZERO,
        }
    }
}

// ============================================================================
// Client-side throttle
// ============================================================================

/// Configuration for the client-side throttle
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per minute
    pub requests_per_minute: u32,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 200,
            burst_size: 200,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_minute: u32, burst_size: u32) -> Self {
        Self {
            requests_per_minute,
            burst_size,
        }
    }

    /// Throttle to `requests_per_minute` with an equally sized burst
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::new(requests_per_minute, requests_per_minute)
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: &RateLimiterConfig) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}
