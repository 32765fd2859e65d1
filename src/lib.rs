// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]

//! # alpaca-fetch
//!
//! A paginated, rate-limit-aware downloader for Alpaca market data.
//!
//! ## Features
//!
//! - **Continuation tokens**: follows `next_page_token` until the provider
//!   reports the last page, resuming from any token
//! - **Rate limits**: paces against `X-RateLimit-*` headers and reissues the
//!   same request after a 429
//! - **Endpoints**: stock bars (one table per symbol), news, market calendar
//! - **CSV output**: append-only files with `url` and `next_page_token`
//!   provenance columns
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use alpaca_fetch::{BarsEndpoint, Credentials, CsvSink, Endpoint, HttpClient,
//!     HttpClientConfig, PaginatedFetcher, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let credentials = Credentials::from_env()?;
//!     let client = HttpClient::with_credentials(HttpClientConfig::default(), &credentials)?;
//!
//!     let bars = BarsEndpoint::new(["AAPL", "TSLA"], "1Day").with_option("start", "2024-01-01");
//!     let mut sink = CsvSink::new("bars/{}.csv");
//!
//!     let summary = PaginatedFetcher::new(client)
//!         .run(&bars.request()?, &bars, &mut sink)
//!         .await?;
//!     println!("{} pages, {} rows", summary.pages, summary.rows_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │              PaginatedFetcher::run(request, extractor, sink) │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬───────────┐
//! │   Auth   │   HTTP    │  Pagination   │ Endpoints │  Output   │
//! ├──────────┼───────────┼───────────────┼───────────┼───────────┤
//! │ Key ID   │ GET       │ Token chain   │ Bars      │ CSV       │
//! │ Secret   │ Headers   │ 429 retry     │ News      │ Memory    │
//! │ .env     │ Throttle  │ Pacing, Clock │ Calendar  │           │
//! └──────────┴───────────┴───────────────┴───────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Provider credentials
pub mod auth;

/// HTTP client and rate limiting
pub mod http;

/// The continuation-token fetch loop
pub mod pagination;

/// Bars, news and calendar endpoints
pub mod endpoints;

/// Table sinks
pub mod output;

/// YAML configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use auth::Credentials;
pub use config::FetcherConfig;
pub use endpoints::{
    BarsEndpoint, CalendarEndpoint, Endpoint, ExtractedTable, NewsEndpoint, PageExtractor,
};
pub use http::{HttpClient, HttpClientConfig, RateLimitPolicy, RateLimitState};
pub use output::{CsvSink, MemorySink, Provenance, TableSink};
pub use pagination::{
    Clock, FetchEvent, FetchObserver, FetchRequest, FetchSummary, ManualClock, PaginatedFetcher,
    RetryPolicy, SystemClock, TracingObserver,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
