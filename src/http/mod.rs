//! HTTP client module
//!
//! Provides the provider-facing HTTP client and rate-limit handling.
//!
//! # Features
//!
//! - **Single-shot GETs**: status, headers and body are returned as-is
//! - **Authentication**: provider key headers attached to every request
//! - **Header pacing**: `X-RateLimit-*` parsing and the wait derived from it
//! - **Client throttle**: optional token bucket using governor

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, PageResponse};
pub use rate_limit::{
    pacing_delay, RateLimitPolicy, RateLimitState, RateLimiter, RateLimiterConfig,
    RATE_LIMIT_LIMIT_HEADER, RATE_LIMIT_REMAINING_HEADER, RATE_LIMIT_RESET_HEADER,
};
