//! Common types used throughout alpaca-fetch
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Provider Contract
// ============================================================================

/// Query parameter carrying the continuation token
pub const PAGE_TOKEN_PARAM: &str = "page_token";

/// Body field carrying the token of the next page
pub const NEXT_PAGE_TOKEN_FIELD: &str = "next_page_token";

/// Provenance column holding the request URL
pub const URL_COLUMN: &str = "url";

/// Provenance column holding the next continuation token
pub const NEXT_PAGE_TOKEN_COLUMN: &str = "next_page_token";

/// Prefix for record fields whose name collides with a provenance column
pub const RECORD_FIELD_PREFIX: &str = "record_";

// ============================================================================
// Query Parameters
// ============================================================================

/// A query parameter value: a single scalar or a list joined with commas
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl QueryValue {
    /// Render the value as it goes on the wire (before percent-encoding)
    pub fn render(&self) -> String {
        match self {
            Self::One(value) => value.clone(),
            Self::Many(values) => values.join(","),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Ordered query parameters
///
/// Insertion order is preserved so the rendered URL is stable; inserting an
/// existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Create an empty parameter list
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a parameter
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Insert only when the key is absent
    pub fn insert_default(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        if !self.contains_key(&key) {
            self.entries.push((key, value.into()));
        }
    }

    /// Get a parameter value
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Remove a parameter, returning its value
    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Check whether a parameter is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Iterate over parameters in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no parameters
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

impl BackoffType {
    /// Delay before retry number `attempt` (zero-based), capped at `max`
    pub fn delay(self, initial: Duration, max: Duration, attempt: u32) -> Duration {
        let delay = match self {
            BackoffType::Constant => initial,
            BackoffType::Linear => initial.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                initial.saturating_mul(factor)
            }
        };

        std::cmp::min(delay, max)
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_query_value_render() {
        assert_eq!(QueryValue::from("1Day").render(), "1Day");
        assert_eq!(QueryValue::from(vec!["AAPL", "TSLA"]).render(), "AAPL,TSLA");
        assert_eq!(QueryValue::from(10_000u32).render(), "10000");
    }

    #[test]
    fn test_query_params_preserve_order_and_replace_in_place() {
        let mut params = QueryParams::new()
            .with("symbols", vec!["AAPL"])
            .with("timeframe", "1Day")
            .with("limit", 100u32);
        params.insert("timeframe", "1Hour");

        let keys: Vec<&str> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["symbols", "timeframe", "limit"]);
        assert_eq!(params.get("timeframe"), Some(&QueryValue::from("1Hour")));
    }

    #[test]
    fn test_query_params_insert_default_keeps_existing() {
        let mut params = QueryParams::new().with("limit", 5u32);
        params.insert_default("limit", 10_000u32);
        params.insert_default("feed", "sip");
        assert_eq!(params.get("limit"), Some(&QueryValue::from(5u32)));
        assert_eq!(params.get("feed"), Some(&QueryValue::from("sip")));
    }

    #[test]
    fn test_query_params_remove() {
        let mut params = QueryParams::new()
            .with("page_token", "abc")
            .with("timeframe", "1Day");
        assert_eq!(params.remove("page_token"), Some(QueryValue::from("abc")));
        assert!(params.remove("page_token").is_none());
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_query_value_deserialize_untagged() {
        let one: QueryValue = serde_json::from_str("\"sip\"").unwrap();
        assert_eq!(one, QueryValue::from("sip"));
        let many: QueryValue = serde_json::from_str(r#"["AAPL","TSLA"]"#).unwrap();
        assert_eq!(many, QueryValue::from(vec!["AAPL", "TSLA"]));
    }

    #[test_case(BackoffType::Constant, 3, 100; "constant")]
    #[test_case(BackoffType::Linear, 2, 300; "linear")]
    #[test_case(BackoffType::Exponential, 3, 800; "exponential")]
    #[test_case(BackoffType::Exponential, 20, 5_000; "exponential capped")]
    fn test_backoff_delay(backoff: BackoffType, attempt: u32, expected_ms: u64) {
        let delay = backoff.delay(
            Duration::from_millis(100),
            Duration::from_secs(5),
            attempt,
        );
        assert_eq!(delay, Duration::from_millis(expected_ms));
    }

    #[test]
    fn test_backoff_serde() {
        let backoff: BackoffType = serde_json::from_str("\"constant\"").unwrap();
        assert_eq!(backoff, BackoffType::Constant);
        assert_eq!(BackoffType::default(), BackoffType::Exponential);
    }

    #[test]
    fn test_option_string_none_if_empty() {
        assert_eq!(
            Some("test".to_string()).none_if_empty(),
            Some("test".to_string())
        );
        assert_eq!(Some(String::new()).none_if_empty(), None);
        assert_eq!(None::<String>.none_if_empty(), None);
        assert_eq!(String::new().none_if_empty(), None);
    }
}
