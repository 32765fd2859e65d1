//! Market calendar
//!
//! `GET /v2/calendar` on the trading host returns a bare JSON array of trading
//! days. There is no continuation token, so the fetch is always one page.

use super::types::{describe_tables, Endpoint, ExtractedTable, PageExtractor};
use crate::error::{Error, Result};
use crate::pagination::FetchRequest;
use crate::types::{JsonValue, QueryParams, QueryValue};

/// Default trading API host
pub const DEFAULT_TRADING_URL: &str = "https://paper-api.alpaca.markets";

const CALENDAR_PATH: &str = "/v2/calendar";

/// Trading days between optional start and end dates
#[derive(Debug, Clone)]
pub struct CalendarEndpoint {
    trading_url: String,
    options: QueryParams,
}

impl Default for CalendarEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl CalendarEndpoint {
    /// Create a calendar request
    pub fn new() -> Self {
        Self {
            trading_url: DEFAULT_TRADING_URL.to_string(),
            options: QueryParams::new(),
        }
    }

    /// Override the trading host
    #[must_use]
    pub fn with_trading_url(mut self, trading_url: impl Into<String>) -> Self {
        self.trading_url = trading_url.into();
        self
    }

    /// Add an optional query parameter (`start`, `end`, ...)
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.options.insert(key, value);
        self
    }
}

impl PageExtractor for CalendarEndpoint {
    fn extract(&self, body: &JsonValue) -> Result<Vec<ExtractedTable>> {
        match body {
            JsonValue::Array(_) => Ok(vec![ExtractedTable::from_array("", body)?]),
            JsonValue::Object(map) => match map.get("calendar") {
                Some(days) => Ok(vec![ExtractedTable::from_array("", days)?]),
                None => Err(Error::extraction(
                    "calendar response is an object without a 'calendar' field",
                )),
            },
            _ => Err(Error::extraction("calendar response is not an array")),
        }
    }

    fn describe_page(&self, tables: &[ExtractedTable]) -> String {
        describe_tables(tables, "date", "days")
    }
}

impl Endpoint for CalendarEndpoint {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn request(&self) -> Result<FetchRequest> {
        let base = format!("{}{CALENDAR_PATH}", self.trading_url.trim_end_matches('/'));
        Ok(FetchRequest::new(base, self.options.clone()))
    }

    fn default_output(&self) -> &'static str {
        "calendar/calendar.csv"
    }
}
