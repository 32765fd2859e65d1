//! News articles
//!
//! `GET /v1beta1/news` returns `{"news": [article, ...], "next_page_token": ...}`,
//! written as a single unnamed table.

use super::bars::DEFAULT_DATA_URL;
use super::types::{describe_tables, Endpoint, ExtractedTable, PageExtractor};
use crate::error::{Error, Result};
use crate::pagination::FetchRequest;
use crate::types::{JsonValue, QueryParams, QueryValue};

/// Largest page the news endpoint serves
pub const DEFAULT_NEWS_LIMIT: u32 = 50;

const NEWS_PATH: &str = "/v1beta1/news";

/// News articles, optionally filtered by symbol
#[derive(Debug, Clone)]
pub struct NewsEndpoint {
    data_url: String,
    symbols: Vec<String>,
    options: QueryParams,
}

impl Default for NewsEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl NewsEndpoint {
    /// Create a news request for all symbols
    pub fn new() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            symbols: Vec::new(),
            options: QueryParams::new(),
        }
    }

    /// Restrict to the given symbols
    #[must_use]
    pub fn with_symbols<S: Into<String>>(mut self, symbols: impl IntoIterator<Item = S>) -> Self {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Override the data host
    #[must_use]
    pub fn with_data_url(mut self, data_url: impl Into<String>) -> Self {
        self.data_url = data_url.into();
        self
    }

    /// Add an optional query parameter
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
}

impl PageExtractor for NewsEndpoint {
    fn extract(&self, body: &JsonValue) -> Result<Vec<ExtractedTable>> {
        match body.get("news") {
            Some(JsonValue::Null) => Ok(Vec::new()),
            Some(news) => Ok(vec![ExtractedTable::from_array("", news)?]),
            None => Err(Error::extraction("response has no 'news' field")),
        }
    }

    fn describe_page(&self, tables: &[ExtractedTable]) -> String {
        describe_tables(tables, "created_at", "articles")
    }
}

impl Endpoint for NewsEndpoint {
    fn name(&self) -> &'static str {
        "news"
    }

    fn request(&self) -> Result<FetchRequest> {
        let mut params = QueryParams::new();
        if !self.symbols.is_empty() {
            params.insert("symbols", self.symbols.clone());
        }
        for (key, value) in self.options.iter() {
            params.insert(key, value.clone());
        }
        params.insert_default("limit", DEFAULT_NEWS_LIMIT);

        let base = format!("{}{NEWS_PATH}", self.data_url.trim_end_matches('/'));
        Ok(FetchRequest::new(base, params))
    }

    fn default_output(&self) -> &'static str {
        "news/news.csv"
    }
}
