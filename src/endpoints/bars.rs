//! Historical stock bars
//!
//! `GET /v2/stocks/bars` returns `{"bars": {SYMBOL: [bar, ...]}, "next_page_token": ...}`.
//! Each symbol becomes its own table.

use super::types::{describe_tables, json_kind, Endpoint, ExtractedTable, PageExtractor};
use crate::error::{Error, Result};
use crate::pagination::FetchRequest;
use crate::types::{JsonValue, QueryParams, QueryValue};
use tracing::warn;

/// Default provider data host
pub const DEFAULT_DATA_URL: &str = "https://data.alpaca.markets";

/// Page size requested when the caller does not set `limit`
pub const DEFAULT_BARS_LIMIT: u32 = 10_000;

const BARS_PATH: &str = "/v2/stocks/bars";

/// Bars for one or more symbols at a given timeframe
#[derive(Debug, Clone)]
pub struct BarsEndpoint {
    data_url: String,
    symbols: Vec<String>,
    timeframe: String,
    options: QueryParams,
}

impl BarsEndpoint {
    /// Create a bars request for `symbols` at `timeframe` (e.g. `1Day`, `5Min`)
    pub fn new<S: Into<String>>(
        symbols: impl IntoIterator<Item = S>,
        timeframe: impl Into<String>,
    ) -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            symbols: symbols.into_iter().map(Into::into).collect(),
            timeframe: timeframe.into(),
            options: QueryParams::new(),
        }
    }

    /// Override the data host (tests, proxies)
    #[must_use]
    pub fn with_data_url(mut self, data_url: impl Into<String>) -> Self {
        self.data_url = data_url.into();
        self
    }

    /// Add an optional query parameter (`start`, `end`, `feed`, `page_token`, ...)
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.options.insert(key, value);
        self
    }

    /// Add several optional query parameters
    #[must_use]
    pub fn with_options(mut self, options: QueryParams) -> Self {
        for (key, value) in options.iter() {
            self.options.insert(key, value.clone());
        }
        self
    }

    /// Requested symbols
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }
}

impl PageExtractor for BarsEndpoint {
    fn extract(&self, body: &JsonValue) -> Result<Vec<ExtractedTable>> {
        let bars = body
            .get("bars")
            .ok_or_else(|| Error::extraction("response has no 'bars' field"))?;

        match bars {
            JsonValue::Null => Ok(Vec::new()),
            JsonValue::Object(by_symbol) => by_symbol
                .iter()
                .map(|(symbol, entries)| ExtractedTable::from_array(symbol.as_str(), entries))
                .collect(),
            other => Err(Error::extraction(format!(
                "'bars' is {}, expected an object keyed by symbol",
                json_kind(other)
            ))),
        }
    }

    fn describe_page(&self, tables: &[ExtractedTable]) -> String {
        describe_tables(tables, "t", "bars")
    }
}

impl Endpoint for BarsEndpoint {
    fn name(&self) -> &'static str {
        "bars"
    }

    fn request(&self) -> Result<FetchRequest> {
        if self.symbols.is_empty() {
            return Err(Error::missing_field("symbols"));
        }
        if self.timeframe.trim().is_empty() {
            return Err(Error::missing_field("timeframe"));
        }

        let mut params = QueryParams::new()
            .with("symbols", self.symbols.clone())
            .with("timeframe", self.timeframe.as_str());
        for (key, value) in self.options.iter() {
            if key == "sort" {
                warn!("Ignoring 'sort' parameter: pages are always fetched in provider order");
                continue;
            }
            params.insert(key, value.clone());
        }
        params.insert_default("limit", DEFAULT_BARS_LIMIT);

        let base = format!("{}{BARS_PATH}", self.data_url.trim_end_matches('/'));
        Ok(FetchRequest::new(base, params))
    }

    fn default_output(&self) -> &'static str {
        "bars/{}.csv"
    }
}
