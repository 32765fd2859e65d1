//! Pagination types
//!
//! The request being paged through, the continuation state carried between
//! pages, the retry policy, and the summary returned when a run completes.

use crate::error::{Error, Result};
use crate::types::{BackoffType, OptionStringExt, QueryParams, PAGE_TOKEN_PARAM};
use std::time::Duration;
use url::Url;

// ============================================================================
// Request
// ============================================================================

/// A paged request: base endpoint, ordered query and optional resume token
///
/// The continuation token never lives in `params`; a `page_token` entry
/// handed to [`FetchRequest::new`] is moved out and becomes the start token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    base: String,
    params: QueryParams,
    start_token: Option<String>,
}

impl FetchRequest {
    /// Create a request, taking a resume token out of `params` if present
    pub fn new(base: impl Into<String>, mut params: QueryParams) -> Self {
        let start_token = params
            .remove(PAGE_TOKEN_PARAM)
            .map(|v| v.render())
            .none_if_empty();
        Self {
            base: base.into(),
            params,
            start_token,
        }
    }

    /// The endpoint without query
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Query parameters (never includes the continuation token)
    pub fn params(&self) -> &QueryParams {
        &self.params
    }

    /// Token of the first page to request, if resuming
    pub fn start_token(&self) -> Option<&str> {
        self.start_token.as_deref()
    }

    /// Base URL with every query parameter applied
    pub fn base_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base)?;
        if !self.params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in self.params.iter() {
                pairs.append_pair(key, &value.render());
            }
        }
        Ok(url)
    }

    /// URL of the page identified by `token` (the first page when `None`)
    pub fn page_url(base_url: &Url, token: Option<&str>) -> String {
        match token {
            Some(token) => {
                let mut url = base_url.clone();
                url.query_pairs_mut().append_pair(PAGE_TOKEN_PARAM, token);
                url.to_string()
            }
            None => base_url.to_string(),
        }
    }
}

// ============================================================================
// Continuation
// ============================================================================

/// Continuation token carried from one page to the next
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContinuationState {
    current: Option<String>,
}

impl ContinuationState {
    /// Start from `token` (absent means the first page)
    pub fn new(token: Option<String>) -> Self {
        Self { current: token }
    }

    /// Token for the page about to be requested
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Move to the page identified by `next`
    ///
    /// A provider handing back the token that was just used would make the
    /// loop fetch the same page forever, so that is rejected.
    pub fn advance(&mut self, next: String) -> Result<()> {
        if self.current.as_deref() == Some(next.as_str()) {
            return Err(Error::pagination(format!(
                "provider returned the same continuation token twice: {next}"
            )));
        }
        self.current = Some(next);
        Ok(())
    }
}

// ============================================================================
// Retry Policy
// ============================================================================

/// How failed requests are retried
///
/// 429 responses default to a fixed 5 second wait with no retry cap; network
/// failures (timeouts, refused connections) back off exponentially and give up
/// after `max_network_retries`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Initial wait after a 429
    pub rate_limit_delay: Duration,
    /// Growth of the 429 wait across consecutive retries
    pub rate_limit_backoff: BackoffType,
    /// Upper bound for any single retry wait
    pub max_retry_delay: Duration,
    /// Consecutive 429s tolerated for one page (`None` = unbounded)
    pub max_rate_limit_retries: Option<u32>,
    /// Consecutive network failures tolerated for one page
    pub max_network_retries: u32,
    /// Initial wait after a network failure
    pub network_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            rate_limit_delay: Duration::from_secs(5),
            rate_limit_backoff: BackoffType::Constant,
            max_retry_delay: Duration::from_secs(300),
            max_rate_limit_retries: None,
            max_network_retries: 3,
            network_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Create the default policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the 429 wait and its growth
    #[must_use]
    pub fn with_rate_limit_backoff(mut self, backoff: BackoffType, initial: Duration) -> Self {
        self.rate_limit_backoff = backoff;
        self.rate_limit_delay = initial;
        self
    }

    /// Cap consecutive 429 retries
    #[must_use]
    pub fn with_max_rate_limit_retries(mut self, retries: Option<u32>) -> Self {
        self.max_rate_limit_retries = retries;
        self
    }

    /// Set network retry count and initial backoff
    #[must_use]
    pub fn with_network_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.max_network_retries = retries;
        self.network_backoff = backoff;
        self
    }

    /// Set the upper bound for a single wait
    #[must_use]
    pub fn with_max_retry_delay(mut self, max: Duration) -> Self {
        self.max_retry_delay = max;
        self
    }

    /// Wait before 429 retry number `attempt` (zero-based)
    pub fn rate_limit_wait(&self, attempt: u32) -> Duration {
        self.rate_limit_backoff
            .delay(self.rate_limit_delay, self.max_retry_delay, attempt)
    }

    /// Wait before network retry number `attempt` (zero-based)
    pub fn network_wait(&self, attempt: u32) -> Duration {
        BackoffType::Exponential.delay(self.network_backoff, self.max_retry_delay, attempt)
    }

    /// Whether another 429 retry is allowed after `retries` so far
    pub fn allows_rate_limit_retry(&self, retries: u32) -> bool {
        self.max_rate_limit_retries.map_or(true, |max| retries < max)
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Pages successfully fetched and written
    pub pages: u64,
    /// HTTP requests issued, retries included
    pub requests: u64,
    /// 429 responses that were retried
    pub rate_limited: u64,
    /// Network failures that were retried
    pub network_retries: u64,
    /// Rows appended across all tables
    pub rows_written: usize,
    /// URL of the last page fetched
    pub last_url: Option<String>,
    /// Token returned with the last page fetched (absent after a complete run)
    pub last_token: Option<String>,
    /// Total time spent waiting (pacing and retries)
    pub waited: Duration,
    /// Wall time of the run in milliseconds
    pub duration_ms: u64,
}

impl FetchSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written page
    pub fn add_page(&mut self, url: &str, next_token: Option<&str>, rows: usize) {
        self.pages += 1;
        self.rows_written += rows;
        self.last_url = Some(url.to_string());
        self.last_token = next_token.map(str::to_string);
    }

    /// Record an issued request
    pub fn add_request(&mut self) {
        self.requests += 1;
    }

    /// Record a wait
    pub fn add_wait(&mut self, wait: Duration) {
        self.waited += wait;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
