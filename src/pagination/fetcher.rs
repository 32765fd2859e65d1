//! The paginated fetch loop
//!
//! One page at a time: request, classify, extract, write, pace, advance.
//! Rows of page N are handed to the sink before page N+1 is requested, so an
//! interrupted run leaves a clean prefix that can be resumed from the last
//! `next_page_token` column.

use super::clock::{Clock, SystemClock};
use super::observer::{FetchEvent, FetchObserver};
use super::types::{ContinuationState, FetchRequest, FetchSummary, RetryPolicy};
use crate::endpoints::{json_kind, PageExtractor};
use crate::error::{Error, Result};
use crate::http::{HttpClient, PageResponse, RateLimitPolicy};
use crate::output::{Provenance, TableSink};
use crate::types::{JsonValue, OptionStringExt, NEXT_PAGE_TOKEN_FIELD};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Drives a paged request to completion
pub struct PaginatedFetcher {
    client: HttpClient,
    retry: RetryPolicy,
    pacing: RateLimitPolicy,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn FetchObserver>>,
}

impl PaginatedFetcher {
    /// Create a fetcher with default retry and pacing policies
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            pacing: RateLimitPolicy::default(),
            clock: Arc::new(SystemClock),
            observers: Vec::new(),
        }
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the pacing policy
    #[must_use]
    pub fn with_pacing(mut self, pacing: RateLimitPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    /// Use a different time source
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Add an observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn FetchObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// The retry policy in use
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Fetch every page of `request`, writing each page's tables to `sink`
    pub async fn run(
        &self,
        request: &FetchRequest,
        extractor: &dyn PageExtractor,
        sink: &mut dyn TableSink,
    ) -> Result<FetchSummary> {
        let start = Instant::now();
        let mut summary = FetchSummary::new();

        let result = self
            .run_pages(request, extractor, sink, &mut summary)
            .await;
        summary.set_duration(start.elapsed().as_millis() as u64);

        match result {
            Ok(()) => {
                self.emit(&FetchEvent::Finished {
                    pages: summary.pages,
                    rows: summary.rows_written,
                });
                Ok(summary)
            }
            Err(error) => {
                self.emit(&FetchEvent::Failed { error: &error });
                Err(error)
            }
        }
    }

    async fn run_pages(
        &self,
        request: &FetchRequest,
        extractor: &dyn PageExtractor,
        sink: &mut dyn TableSink,
        summary: &mut FetchSummary,
    ) -> Result<()> {
        let base_url = request.base_url()?;
        self.emit(&FetchEvent::Started {
            base_url: base_url.as_str(),
            start_token: request.start_token(),
        });

        let mut continuation = ContinuationState::new(request.start_token().map(str::to_string));

        loop {
            let page = summary.pages + 1;
            let url = FetchRequest::page_url(&base_url, continuation.current());

            let response = self.fetch_page(&url, page, summary).await?;
            let rate_limit = response.rate_limit();
            let body = response.json().map_err(|e| {
                Error::extraction(format!("page {page} body is not valid JSON: {e}"))
            })?;
            let next_token = next_page_token(&body)?;

            let tables = extractor.extract(&body)?;
            let provenance = Provenance::new(&url, next_token.as_deref());
            let mut rows = 0;
            for table in &tables {
                rows += sink.append(table, &provenance)?;
            }
            summary.add_page(&url, next_token.as_deref(), rows);

            let message = extractor.describe_page(&tables);
            self.emit(&FetchEvent::Page {
                page,
                url: &url,
                next_token: next_token.as_deref(),
                rate_limit: &rate_limit,
                rows,
                message: &message,
            });

            let Some(next) = next_token else {
                return Ok(());
            };
            continuation.advance(next)?;

            let wait = self.pacing.wait_for(&rate_limit, self.clock.now());
            if !wait.is_zero() {
                self.emit(&FetchEvent::Pacing {
                    wait,
                    rate_limit: &rate_limit,
                });
                self.pause(wait, summary).await;
            }
        }
    }

    /// Issue the request for one page until it succeeds or fails fatally
    async fn fetch_page(
        &self,
        url: &str,
        page: u64,
        summary: &mut FetchSummary,
    ) -> Result<PageResponse> {
        let mut throttled: u32 = 0;
        let mut failures: u32 = 0;

        loop {
            self.emit(&FetchEvent::Request { page, url });
            summary.add_request();

            let response = match self.client.get(url).await {
                Ok(response) => response,
                Err(error)
                    if error.is_transient_network() && failures < self.retry.max_network_retries =>
                {
                    let wait = self.retry.network_wait(failures);
                    failures += 1;
                    summary.network_retries += 1;
                    self.emit(&FetchEvent::NetworkRetry {
                        url,
                        attempt: failures,
                        wait,
                        error: &error,
                    });
                    self.pause(wait, summary).await;
                    continue;
                }
                Err(error) => return Err(error),
            };

            match response.status {
                200 => return Ok(response),
                429 => {
                    if !self.retry.allows_rate_limit_retry(throttled) {
                        return Err(Error::RateLimitRetriesExhausted {
                            retries: throttled,
                            body: response.body,
                        });
                    }
                    let wait = self.retry.rate_limit_wait(throttled);
                    throttled += 1;
                    summary.rate_limited += 1;
                    self.emit(&FetchEvent::RateLimited {
                        url,
                        attempt: throttled,
                        wait,
                        rate_limit: &response.rate_limit(),
                    });
                    self.pause(wait, summary).await;
                }
                403 => return Err(Error::auth(403, response.body)),
                status => return Err(Error::http_status(status, response.body)),
            }
        }
    }

    async fn pause(&self, wait: Duration, summary: &mut FetchSummary) {
        summary.add_wait(wait);
        self.clock.sleep(wait).await;
    }

    fn emit(&self, event: &FetchEvent<'_>) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}

impl std::fmt::Debug for PaginatedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedFetcher")
            .field("client", &self.client)
            .field("retry", &self.retry)
            .field("pacing", &self.pacing)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

/// Read the continuation token from a page body
///
/// Missing, `null` and empty all mean "last page". Bodies that are not
/// objects (e.g. a bare array) never carry a token.
pub fn next_page_token(body: &JsonValue) -> Result<Option<String>> {
    match body.get(NEXT_PAGE_TOKEN_FIELD) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(token)) => Ok(token.clone().none_if_empty()),
        Some(other) => Err(Error::extraction(format!(
            "'{NEXT_PAGE_TOKEN_FIELD}' is {}, expected a string",
            json_kind(other)
        ))),
    }
}
