//! Endpoint strategies
//!
//! Supports: Bars, News, Calendar
//!
//! # Overview
//!
//! Each endpoint knows how to build its request and how to split a page
//! body into named tables. The fetch loop itself is endpoint-agnostic and
//! only talks to the `PageExtractor` half of the strategy.

mod bars;
mod calendar;
mod news;
mod types;

pub use bars::{BarsEndpoint, DEFAULT_BARS_LIMIT, DEFAULT_DATA_URL};
pub use calendar::{CalendarEndpoint, DEFAULT_TRADING_URL};
pub use news::{NewsEndpoint, DEFAULT_NEWS_LIMIT};
pub use types::{Endpoint, ExtractedTable, PageExtractor, TableSummary};
pub(crate) use types::json_kind;
