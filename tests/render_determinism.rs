//! Render Determinism Tests
//!
//! - Rendering the same rows twice yields identical bodies
//! - Empty results still render a complete document in every format
//! - Column order follows the projection, never the row payload

use gbads_engine::query::{render, render_count, OutputFormat, ResultSet};
use serde_json::{json, Value};

const ALL_FORMATS: [OutputFormat; 5] = [
    OutputFormat::Structured,
    OutputFormat::Markup,
    OutputFormat::Text,
    OutputFormat::Csv,
    OutputFormat::File,
];

fn rows() -> ResultSet {
    ResultSet::new(
        vec!["species".into(), "year".into(), "population".into()],
        vec![
            vec![json!("Goats"), json!(2017), json!(32.5)],
            vec![json!("Sheep, adult"), json!(2018), Value::Null],
        ],
    )
}

#[test]
fn test_render_is_idempotent() {
    let rs = rows();
    for format in ALL_FORMATS {
        let first = render(&rs, format, "livestock");
        for _ in 0..10 {
            assert_eq!(render(&rs, format, "livestock"), first, "{}", format);
        }
    }
}

#[test]
fn test_empty_results_are_non_empty_documents() {
    let rs = ResultSet::empty(vec!["species".into(), "year".into()]);
    for format in ALL_FORMATS {
        let rendered = render(&rs, format, "livestock");
        assert!(!rendered.body.is_empty(), "{}", format);
    }
    assert_eq!(render(&rs, OutputFormat::Structured, "t").body, "[]");
}

#[test]
fn test_structured_key_order_follows_projection() {
    let rendered = render(&rows(), OutputFormat::Structured, "t");
    assert_eq!(
        rendered.body,
        r#"[{"species":"Goats","year":2017,"population":32.5},{"species":"Sheep, adult","year":2018,"population":null}]"#
    );
    let parsed: Value = serde_json::from_str(&rendered.body).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(2));
}

#[test]
fn test_csv_quotes_embedded_commas() {
    let rendered = render(&rows(), OutputFormat::Csv, "t");
    let lines: Vec<&str> = rendered.body.lines().collect();
    assert_eq!(lines[0], "\"species\",\"year\",\"population\"");
    assert_eq!(lines[2], "\"Sheep, adult\",\"2018\",\"\"");
    assert!(rendered.filename.is_none());
}

#[test]
fn test_file_format_names_attachment() {
    let rendered = render(&rows(), OutputFormat::File, "livestock_national_population_oie");
    assert_eq!(
        rendered.filename.as_deref(),
        Some("livestock_national_population_oie.csv")
    );
    assert_eq!(rendered.body, render(&rows(), OutputFormat::Csv, "x").body);
}

#[test]
fn test_markup_rows_follow_result_order() {
    let html = render(&rows(), OutputFormat::Markup, "t").body;
    let goats = html.find("<td>Goats</td>").unwrap();
    let sheep = html.find("<td>Sheep, adult</td>").unwrap();
    assert!(goats < sheep);
    assert!(html.starts_with("<!DOCTYPE html>"));
}

#[test]
fn test_count_in_every_format() {
    for format in ALL_FORMATS {
        let rendered = render_count(3, format, "t");
        assert!(rendered.body.contains('3'), "{}", format);
        assert_eq!(rendered.content_type, format.content_type());
    }
}
