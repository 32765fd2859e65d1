//! Output module
//!
//! Handles appending extracted tables to their destinations.
//!
//! # Overview
//!
//! This module provides:
//! - `TableSink`, the append-only contract used by the fetch loop
//! - `CsvSink`, one CSV file per table with `url` and `next_page_token` columns
//! - `MemorySink`, which records appends for inspection

mod writer;

pub use writer::{render_value, CsvSink, MemorySink, Provenance, SinkAppend, TableSink};

#[cfg(test)]
mod tests;
