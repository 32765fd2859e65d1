//! Tests for output module

use super::*;
use crate::endpoints::ExtractedTable;
use crate::types::{JsonObject, JsonValue};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use tempfile::tempdir;
use test_case::test_case;

fn records(values: JsonValue) -> Vec<JsonObject> {
    values
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect()
}

fn bars(symbol: &str, values: JsonValue) -> ExtractedTable {
    ExtractedTable::new(symbol, records(values))
}

// ============================================================================
// Path Template Tests
// ============================================================================

#[test_case("bars/{}.csv", "AAPL", "bars/AAPL.csv" ; "plain symbol")]
#[test_case("bars/{}.csv", "BRK/B", "bars/BRK_B.csv" ; "slash")]
#[test_case("bars/{}.csv", "A\\B", "bars/A_B.csv" ; "backslash")]
#[test_case("news/news.csv", "", "news/news.csv" ; "no placeholder")]
fn test_csv_sink_path_for(template: &str, name: &str, expected: &str) {
    let sink = CsvSink::new(template);
    assert_eq!(sink.path_for(name), std::path::PathBuf::from(expected));
}

// ============================================================================
// CSV Sink Tests
// ============================================================================

#[test]
fn test_csv_sink_writes_header_once() {
    let dir = tempdir().unwrap();
    let mut sink = CsvSink::in_dir(dir.path(), "bars/{}.csv");

    let first = bars(
        "AAPL",
        json!([
            {"t": "2024-01-02T05:00:00Z", "o": 187.15, "c": 185.64},
            {"t": "2024-01-03T05:00:00Z", "o": 184.22, "c": 184.25}
        ]),
    );
    let second = bars(
        "AAPL",
        json!([{"t": "2024-01-04T05:00:00Z", "o": 182.15, "c": 181.91}]),
    );

    let url1 = "https://data.example.com/v2/stocks/bars?symbols=AAPL";
    let url2 = "https://data.example.com/v2/stocks/bars?symbols=AAPL&page_token=abc";
    assert_eq!(sink.append(&first, &Provenance::new(url1, Some("abc"))).unwrap(), 2);
    assert_eq!(sink.append(&second, &Provenance::new(url2, None)).unwrap(), 1);

    let content = fs::read_to_string(dir.path().join("bars/AAPL.csv")).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "t,o,c,url,next_page_token",
            "2024-01-02T05:00:00Z,187.15,185.64,https://data.example.com/v2/stocks/bars?symbols=AAPL,abc",
            "2024-01-03T05:00:00Z,184.22,184.25,https://data.example.com/v2/stocks/bars?symbols=AAPL,abc",
            "2024-01-04T05:00:00Z,182.15,181.91,https://data.example.com/v2/stocks/bars?symbols=AAPL&page_token=abc,",
        ]
    );
    assert_eq!(sink.rows_written().get("AAPL"), Some(&3));
}

#[test]
fn test_csv_sink_separate_file_per_table() {
    let dir = tempdir().unwrap();
    let mut sink = CsvSink::in_dir(dir.path(), "bars/{}.csv");
    let provenance = Provenance::new("https://x", None);

    sink.append(&bars("AAPL", json!([{"t": "a"}])), &provenance)
        .unwrap();
    sink.append(&bars("TSLA", json!([{"t": "b"}, {"t": "c"}])), &provenance)
        .unwrap();

    let aapl = fs::read_to_string(dir.path().join("bars/AAPL.csv")).unwrap();
    let tsla = fs::read_to_string(dir.path().join("bars/TSLA.csv")).unwrap();
    assert_eq!(aapl.lines().count(), 2);
    assert_eq!(tsla.lines().count(), 3);
}

#[test]
fn test_csv_sink_empty_table_writes_nothing() {
    let dir = tempdir().unwrap();
    let mut sink = CsvSink::in_dir(dir.path(), "bars/{}.csv");

    let written = sink
        .append(&ExtractedTable::new("AAPL", Vec::new()), &Provenance::new("https://x", None))
        .unwrap();

    assert_eq!(written, 0);
    assert!(!dir.path().join("bars/AAPL.csv").exists());
}

#[test]
fn test_csv_sink_appends_to_existing_file_in_its_column_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("AAPL.csv");
    fs::write(&path, "c,t,url,next_page_token\n1.0,old,https://old,tok\n").unwrap();

    let mut sink = CsvSink::in_dir(dir.path(), "{}.csv");
    sink.append(
        &bars("AAPL", json!([{"t": "new", "c": 2.5, "vw": 2.4}])),
        &Provenance::new("https://new", None),
    )
    .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "c,t,url,next_page_token\n1.0,old,https://old,tok\n2.5,new,https://new,\n"
    );
}

#[test]
fn test_csv_sink_empty_existing_file_gets_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("news.csv");
    fs::write(&path, "").unwrap();

    let mut sink = CsvSink::in_dir(dir.path(), "news.csv");
    sink.append(
        &ExtractedTable::new("", records(json!([{"id": 1}]))),
        &Provenance::new("https://x", None),
    )
    .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, "id,url,next_page_token\n1,https://x,\n");
}

#[test]
fn test_csv_sink_renders_nested_values_as_json() {
    let dir = tempdir().unwrap();
    let mut sink = CsvSink::in_dir(dir.path(), "news.csv");

    let table = ExtractedTable::new(
        "",
        records(json!([{
            "id": 24803233,
            "symbols": ["AAPL", "TSLA"],
            "images": [],
            "summary": null,
            "headline": "Markets, today"
        }])),
    );
    sink.append(&table, &Provenance::new("https://x", None)).unwrap();

    let mut reader = csv::Reader::from_path(dir.path().join("news.csv")).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        header,
        vec!["id", "symbols", "images", "summary", "headline", "url", "next_page_token"]
    );
    let row = reader.records().next().unwrap().unwrap();
    assert_eq!(&row[0], "24803233");
    assert_eq!(&row[1], r#"["AAPL","TSLA"]"#);
    assert_eq!(&row[2], "[]");
    assert_eq!(&row[3], "");
    assert_eq!(&row[4], "Markets, today");
}

#[test]
fn test_csv_sink_union_of_fields_across_records() {
    let dir = tempdir().unwrap();
    let mut sink = CsvSink::in_dir(dir.path(), "{}.csv");

    sink.append(
        &bars("X", json!([{"a": 1}, {"a": 2, "b": 3}])),
        &Provenance::new("https://x", None),
    )
    .unwrap();

    let content = fs::read_to_string(dir.path().join("X.csv")).unwrap();
    assert_eq!(content, "a,b,url,next_page_token\n1,,https://x,\n2,3,https://x,\n");
}

#[test]
fn test_csv_sink_same_input_same_bytes() {
    let write = || {
        let dir = tempdir().unwrap();
        let mut sink = CsvSink::in_dir(dir.path(), "{}.csv");
        sink.append(
            &bars("AAPL", json!([{"t": "a", "v": 1}, {"t": "b", "v": 2}])),
            &Provenance::new("https://x?a=1", Some("n1")),
        )
        .unwrap();
        sink.append(
            &bars("AAPL", json!([{"t": "c", "v": 3}])),
            &Provenance::new("https://x?a=1&page_token=n1", None),
        )
        .unwrap();
        fs::read(dir.path().join("AAPL.csv")).unwrap()
    };

    assert_eq!(write(), write());
}

#[test]
fn test_csv_sink_rejects_tables_sharing_a_file() {
    let dir = tempdir().unwrap();
    let mut sink = CsvSink::in_dir(dir.path(), "bars.csv");
    let provenance = Provenance::new("https://x", None);

    sink.append(&bars("AAPL", json!([{"t": "a"}])), &provenance)
        .unwrap();
    sink.append(&bars("AAPL", json!([{"t": "b"}])), &provenance)
        .unwrap();
    let err = sink
        .append(&bars("TSLA", json!([{"t": "c"}])), &provenance)
        .unwrap_err();

    assert!(matches!(err, crate::error::Error::Output { .. }));
    assert!(err.to_string().contains("'AAPL' and 'TSLA'"));
}

#[test]
fn test_csv_sink_keeps_record_fields_named_like_provenance() {
    let dir = tempdir().unwrap();
    let mut sink = CsvSink::in_dir(dir.path(), "news.csv");

    let table = ExtractedTable::new(
        "",
        records(json!([{
            "id": 1,
            "headline": "h",
            "url": "https://news.example/article-1",
            "next_page_token": "inner"
        }])),
    );
    sink.append(&table, &Provenance::new("https://data.example.com/v1beta1/news", Some("n1")))
        .unwrap();

    let content = fs::read_to_string(dir.path().join("news.csv")).unwrap();
    assert_eq!(
        content,
        "id,headline,record_url,record_next_page_token,url,next_page_token\n\
         1,h,https://news.example/article-1,inner,https://data.example.com/v1beta1/news,n1\n"
    );
}

#[test]
fn test_csv_sink_appends_record_url_to_existing_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("news.csv");
    fs::write(&path, "id,record_url,url,next_page_token\n1,https://a,https://x,\n").unwrap();

    let mut sink = CsvSink::in_dir(dir.path(), "news.csv");
    sink.append(
        &ExtractedTable::new("", records(json!([{"id": 2, "url": "https://b"}]))),
        &Provenance::new("https://y", None),
    )
    .unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "id,record_url,url,next_page_token\n1,https://a,https://x,\n2,https://b,https://y,\n"
    );
}

#[test]
fn test_csv_sink_fallback_name_for_unnamed_tables() {
    let sink = CsvSink::new("news/{}.csv").with_fallback_name("news");
    assert_eq!(sink.path_for(""), std::path::PathBuf::from("news/news.csv"));
    assert_eq!(sink.path_for("AAPL"), std::path::PathBuf::from("news/AAPL.csv"));
}

#[test]
fn test_render_value() {
    assert_eq!(render_value(&json!(null)), "");
    assert_eq!(render_value(&json!("text")), "text");
    assert_eq!(render_value(&json!(true)), "true");
    assert_eq!(render_value(&json!(42)), "42");
    assert_eq!(render_value(&json!({"k": "v"})), r#"{"k":"v"}"#);
}

// ============================================================================
// Memory Sink Tests
// ============================================================================

#[test]
fn test_memory_sink_records_appends() {
    let mut sink = MemorySink::new();

    sink.append(
        &bars("AAPL", json!([{"t": "a"}, {"t": "b"}])),
        &Provenance::new("https://x", Some("abc")),
    )
    .unwrap();
    sink.append(
        &bars("TSLA", json!([{"t": "c"}])),
        &Provenance::new("https://x", Some("abc")),
    )
    .unwrap();

    assert_eq!(sink.appends().len(), 2);
    assert_eq!(sink.total_rows(), 3);
    assert_eq!(sink.table("TSLA").len(), 1);
    assert_eq!(sink.appends()[0].next_page_token.as_deref(), Some("abc"));
}
