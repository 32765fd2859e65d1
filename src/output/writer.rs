//! Table sinks
//!
//! Provides the append-only destinations the fetch loop writes pages into.

use crate::endpoints::ExtractedTable;
use crate::error::{Error, Result, ResultExt};
use crate::types::{
    JsonObject, JsonValue, NEXT_PAGE_TOKEN_COLUMN, RECORD_FIELD_PREFIX, URL_COLUMN,
};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where a page's rows came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance<'a> {
    /// URL of the request that produced the rows
    pub url: &'a str,
    /// Token of the page after this one
    pub next_page_token: Option<&'a str>,
}

impl<'a> Provenance<'a> {
    /// Create provenance for one page
    pub fn new(url: &'a str, next_page_token: Option<&'a str>) -> Self {
        Self {
            url,
            next_page_token,
        }
    }
}

/// Append-only destination keyed by table name
pub trait TableSink: Send {
    /// Append `table`'s records, each tagged with `provenance`
    ///
    /// Called once per page per table. Returns the number of rows written.
    fn append(&mut self, table: &ExtractedTable, provenance: &Provenance<'_>) -> Result<usize>;
}

// ============================================================================
// CSV
// ============================================================================

/// One CSV file per table
///
/// The file is created with a header on first write and appended to without
/// one afterwards. When the file already exists its header decides the column
/// order; fields it does not know are dropped with a warning. Two tables
/// resolving to the same file is an error.
///
/// Record fields named like a provenance column are kept under a
/// `record_`-prefixed column (a news article's own `url` lands in
/// `record_url`).
#[derive(Debug, Clone)]
pub struct CsvSink {
    path_template: String,
    fallback_name: Option<String>,
    rows_written: BTreeMap<String, usize>,
    owners: HashMap<PathBuf, String>,
}

impl CsvSink {
    /// Create a sink; `{}` in the template is replaced with the table name
    pub fn new(path_template: impl Into<String>) -> Self {
        Self {
            path_template: path_template.into(),
            fallback_name: None,
            rows_written: BTreeMap::new(),
            owners: HashMap::new(),
        }
    }

    /// Create a sink whose template is resolved under `dir`
    pub fn in_dir(dir: impl AsRef<Path>, path_template: &str) -> Self {
        Self::new(dir.as_ref().join(path_template).to_string_lossy().into_owned())
    }

    /// Name substituted for `{}` when a table has no name of its own
    #[must_use]
    pub fn with_fallback_name(mut self, name: impl Into<String>) -> Self {
        self.fallback_name = Some(name.into());
        self
    }

    /// The path template
    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    /// File backing the table `name`
    pub fn path_for(&self, name: &str) -> PathBuf {
        let name = match self.fallback_name.as_deref() {
            Some(fallback) if name.is_empty() => fallback,
            _ => name,
        };
        let safe: String = name
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        PathBuf::from(self.path_template.replace("{}", &safe))
    }

    /// Rows appended per table during this sink's lifetime
    pub fn rows_written(&self) -> &BTreeMap<String, usize> {
        &self.rows_written
    }

    fn claim(&mut self, path: &Path, name: &str) -> Result<()> {
        match self.owners.get(path) {
            Some(owner) if owner != name => Err(Error::output(format!(
                "tables '{owner}' and '{name}' both resolve to {}; add '{{}}' to the output template",
                path.display()
            ))),
            Some(_) => Ok(()),
            None => {
                self.owners.insert(path.to_path_buf(), name.to_string());
                Ok(())
            }
        }
    }
}

impl TableSink for CsvSink {
    fn append(&mut self, table: &ExtractedTable, provenance: &Provenance<'_>) -> Result<usize> {
        if table.is_empty() {
            return Ok(0);
        }

        let path = self.path_for(&table.name);
        self.claim(&path, &table.name)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let (columns, new_file) = match read_header(&path)? {
            Some(header) => (header, false),
            None => (columns_for(&table.records), true),
        };

        if !new_file {
            let dropped = unknown_fields(&table.records, &columns);
            if !dropped.is_empty() {
                warn!(
                    "{}: dropping fields not in existing header: {}",
                    path.display(),
                    dropped.into_iter().collect::<Vec<_>>().join(", ")
                );
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if new_file {
            writer.write_record(&columns)?;
        }
        for record in &table.records {
            writer.write_record(columns.iter().map(|c| cell(record, c, provenance)))?;
        }
        writer.flush()?;

        debug!("Appended {} rows to {}", table.len(), path.display());
        *self.rows_written.entry(table.name.clone()).or_default() += table.len();
        Ok(table.len())
    }
}

/// Header of an existing, non-empty CSV file
fn read_header(path: &Path) -> Result<Option<Vec<String>>> {
    let has_rows = path.is_file() && fs::metadata(path)?.len() > 0;
    if !has_rows {
        return Ok(None);
    }
    let mut reader = csv::Reader::from_path(path)?;
    Ok(Some(reader.headers()?.iter().map(str::to_string).collect()))
}

/// Columns for a new file: record fields in first-seen order, then provenance
fn columns_for(records: &[JsonObject]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for key in records.iter().flat_map(|r| r.keys()) {
        let column = column_for_field(key);
        if seen.insert(column.clone()) {
            columns.push(column.into_owned());
        }
    }
    columns.push(URL_COLUMN.to_string());
    columns.push(NEXT_PAGE_TOKEN_COLUMN.to_string());
    columns
}

fn unknown_fields<'r>(records: &'r [JsonObject], columns: &[String]) -> BTreeSet<&'r str> {
    records
        .iter()
        .flat_map(|r| r.keys())
        .map(String::as_str)
        .filter(|key| {
            let column = column_for_field(key);
            !columns.iter().any(|c| *c == column)
        })
        .collect()
}

fn is_provenance_column(name: &str) -> bool {
    name == URL_COLUMN || name == NEXT_PAGE_TOKEN_COLUMN
}

/// Column holding a record field; provenance names get the record prefix
fn column_for_field(field: &str) -> Cow<'_, str> {
    if is_provenance_column(field) {
        Cow::Owned(format!("{RECORD_FIELD_PREFIX}{field}"))
    } else {
        Cow::Borrowed(field)
    }
}

/// Record field held by a non-provenance column
fn field_for_column(column: &str) -> &str {
    match column.strip_prefix(RECORD_FIELD_PREFIX) {
        Some(field) if is_provenance_column(field) => field,
        _ => column,
    }
}

fn cell(record: &JsonObject, column: &str, provenance: &Provenance<'_>) -> String {
    match column {
        URL_COLUMN => provenance.url.to_string(),
        NEXT_PAGE_TOKEN_COLUMN => provenance.next_page_token.unwrap_or_default().to_string(),
        _ => record
            .get(field_for_column(column))
            .map(render_value)
            .unwrap_or_default(),
    }
}

/// Render a JSON value as a CSV cell; nested values stay JSON
pub fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(_) | JsonValue::Object(_) => value.to_string(),
    }
}

// ============================================================================
// Memory
// ============================================================================

/// One recorded append
#[derive(Debug, Clone, PartialEq)]
pub struct SinkAppend {
    /// Table name
    pub name: String,
    /// Request URL provenance
    pub url: String,
    /// Next-token provenance
    pub next_page_token: Option<String>,
    /// Records as handed to the sink
    pub records: Vec<JsonObject>,
}

/// Sink that keeps every append in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    appends: Vec<SinkAppend>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Every append, in order
    pub fn appends(&self) -> &[SinkAppend] {
        &self.appends
    }

    /// Appends made to the table `name`
    pub fn table(&self, name: &str) -> Vec<&SinkAppend> {
        self.appends.iter().filter(|a| a.name == name).collect()
    }

    /// Total rows across all appends
    pub fn total_rows(&self) -> usize {
        self.appends.iter().map(|a| a.records.len()).sum()
    }
}

impl TableSink for MemorySink {
    fn append(&mut self, table: &ExtractedTable, provenance: &Provenance<'_>) -> Result<usize> {
        self.appends.push(SinkAppend {
            name: table.name.clone(),
            url: provenance.url.to_string(),
            next_page_token: provenance.next_page_token.map(str::to_string),
            records: table.records.clone(),
        });
        Ok(table.len())
    }
}
