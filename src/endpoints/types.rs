//! Endpoint types and traits
//!
//! Defines the per-endpoint strategy used by the fetch loop and the table
//! type produced from each page.

use crate::error::{Error, Result};
use crate::pagination::FetchRequest;
use crate::types::{JsonObject, JsonValue};

/// Records extracted from one page for one logical series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedTable {
    /// Series name; may be empty for single-table endpoints
    pub name: String,
    /// Uniform records, one JSON object each
    pub records: Vec<JsonObject>,
}

impl ExtractedTable {
    /// Create a table
    pub fn new(name: impl Into<String>, records: Vec<JsonObject>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Build a table from a JSON array of objects
    pub fn from_array(name: impl Into<String>, value: &JsonValue) -> Result<Self> {
        let name = name.into();
        let items = value.as_array().ok_or_else(|| {
            Error::extraction(format!(
                "expected an array of records for '{name}', got {}",
                json_kind(value)
            ))
        })?;

        let records = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_object().cloned().ok_or_else(|| {
                    Error::extraction(format!(
                        "record {i} of '{name}' is {}, expected an object",
                        json_kind(item)
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { name, records })
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Summarize the table using `time_field` for the covered range
    pub fn summarize(&self, time_field: &str) -> TableSummary {
        let stamp = |record: Option<&JsonObject>| {
            record
                .and_then(|r| r.get(time_field))
                .map(|v| match v {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                })
        };

        TableSummary {
            name: self.name.clone(),
            rows: self.records.len(),
            first: stamp(self.records.first()),
            last: stamp(self.records.last()),
        }
    }
}

/// Row count and covered time range of one written table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    /// Series name
    pub name: String,
    /// Records in the table
    pub rows: usize,
    /// Time field of the first record
    pub first: Option<String>,
    /// Time field of the last record
    pub last: Option<String>,
}

impl TableSummary {
    /// Render as `NAME: first to last (N unit)`
    pub fn describe(&self, unit: &str) -> String {
        let label = if self.name.is_empty() {
            unit
        } else {
            self.name.as_str()
        };
        match (&self.first, &self.last) {
            (Some(first), Some(last)) => {
                format!("{label}: {first} to {last} ({} {unit})", self.rows)
            }
            _ => format!("{label}: ({} {unit})", self.rows),
        }
    }
}

/// Per-endpoint page handling used by the fetch loop
pub trait PageExtractor: Send + Sync {
    /// Split one page body into named tables
    ///
    /// Must be pure; a malformed body is reported as an extraction error.
    fn extract(&self, body: &JsonValue) -> Result<Vec<ExtractedTable>>;

    /// Progress message for a page that produced `tables`
    fn describe_page(&self, tables: &[ExtractedTable]) -> String;
}

/// A provider endpoint: request construction plus page handling
pub trait Endpoint: PageExtractor {
    /// Short endpoint name (used for logs and default output paths)
    fn name(&self) -> &'static str;

    /// The request to run, including any resume token
    fn request(&self) -> Result<FetchRequest>;

    /// Default output path template (`{}` is replaced with the table name)
    fn default_output(&self) -> &'static str;
}

/// Describe the JSON type of a value for error messages
pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

/// Join table summaries into a multi-line progress message
pub(crate) fn describe_tables(tables: &[ExtractedTable], time_field: &str, unit: &str) -> String {
    if tables.is_empty() {
        return format!("no {unit}");
    }
    tables
        .iter()
        .map(|t| t.summarize(time_field).describe(unit))
        .collect::<Vec<_>>()
        .join("\n\t- ")
}
