//! Pagination module
//!
//! The continuation-token fetch loop and everything it is parameterised by.
//!
//! # Overview
//!
//! `PaginatedFetcher::run` requests a page, classifies the status (200 proceeds,
//! 429 waits and reissues the same URL, 403 and anything else abort), hands the
//! extracted tables to a sink with provenance, then paces itself against the
//! provider's `X-RateLimit-*` headers before following `next_page_token`.
//! Waiting goes through a `Clock`, reporting through `FetchObserver`s.

mod clock;
mod fetcher;
mod observer;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use fetcher::{next_page_token, PaginatedFetcher};
pub use observer::{FetchEvent, FetchObserver, TracingObserver};
pub use types::{ContinuationState, FetchRequest, FetchSummary, RetryPolicy};
