//! Fetch events and observers
//!
//! The fetch loop reports what it does through `FetchObserver`s handed to it
//! by the caller; it holds no logging state of its own.

use crate::error::Error;
use crate::http::RateLimitState;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Something the fetch loop did
#[derive(Debug)]
pub enum FetchEvent<'a> {
    /// A run is starting
    Started {
        /// Base URL (no continuation token)
        base_url: &'a str,
        /// Resume token, if any
        start_token: Option<&'a str>,
    },
    /// A request is about to be issued
    Request {
        /// One-based number of the page being requested
        page: u64,
        /// Full request URL
        url: &'a str,
    },
    /// The provider answered 429; the same URL will be retried
    RateLimited {
        /// Request URL
        url: &'a str,
        /// Consecutive 429s for this page
        attempt: u32,
        /// Wait before the retry
        wait: Duration,
        /// Rate-limit headers of the 429 response
        rate_limit: &'a RateLimitState,
    },
    /// A transport failure will be retried
    NetworkRetry {
        /// Request URL
        url: &'a str,
        /// Consecutive failures for this page
        attempt: u32,
        /// Wait before the retry
        wait: Duration,
        /// The failure
        error: &'a Error,
    },
    /// A page was fetched and written
    Page {
        /// One-based page number
        page: u64,
        /// Request URL
        url: &'a str,
        /// Token of the following page
        next_token: Option<&'a str>,
        /// Bucket advertised by the response
        rate_limit: &'a RateLimitState,
        /// Rows written for this page
        rows: usize,
        /// Endpoint-specific description of what was written
        message: &'a str,
    },
    /// The bucket is empty; waiting before the next page
    Pacing {
        /// Wait before the next page
        wait: Duration,
        /// Bucket advertised by the last response
        rate_limit: &'a RateLimitState,
    },
    /// The last page was written
    Finished {
        /// Pages written
        pages: u64,
        /// Rows written
        rows: usize,
    },
    /// The run stopped on a fatal error
    Failed {
        /// The error
        error: &'a Error,
    },
}

/// Receives fetch events
pub trait FetchObserver: Send + Sync {
    /// Handle one event
    fn on_event(&self, event: &FetchEvent<'_>);
}

/// Logs fetch events through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl FetchObserver for TracingObserver {
    fn on_event(&self, event: &FetchEvent<'_>) {
        match event {
            FetchEvent::Started {
                base_url,
                start_token,
            } => match start_token {
                Some(token) => info!("Resuming {base_url} from page token {token}"),
                None => info!("Starting {base_url}"),
            },
            FetchEvent::Request { page, url } => debug!("Requesting page {page}: {url}"),
            FetchEvent::RateLimited {
                url,
                attempt,
                wait,
                rate_limit,
            } => warn!(
                "HTTP 429 on {url} (attempt {attempt}, rate limit {rate_limit}), retrying in {:.1}s",
                wait.as_secs_f64()
            ),
            FetchEvent::NetworkRetry {
                url,
                attempt,
                wait,
                error,
            } => warn!(
                "Request to {url} failed (attempt {attempt}): {error}; retrying in {:.1}s",
                wait.as_secs_f64()
            ),
            FetchEvent::Page {
                page,
                next_token,
                rate_limit,
                rows,
                message,
                ..
            } => info!(
                "Fetched page {page} ({rows} rows), next token {}, rate limit {rate_limit}\n\t- {message}",
                next_token.unwrap_or("<none>")
            ),
            FetchEvent::Pacing { wait, rate_limit } => info!(
                "Rate limit exhausted ({rate_limit}), waiting {:.1}s",
                wait.as_secs_f64()
            ),
            FetchEvent::Finished { pages, rows } => {
                info!("Finished fetching pages: {pages} pages, {rows} rows");
            }
            FetchEvent::Failed { error } => error!("Fetch failed: {error}"),
        }
    }
}
