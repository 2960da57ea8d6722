//! Result rendering
//!
//! Pure functions from a [`ResultSet`] to a body in the requested format.
//! Column order is always the projected order, and an empty result still
//! produces a complete document.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use super::errors::QueryError;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON array of records
    Structured,
    /// HTML table document
    Markup,
    /// Header line plus comma-joined rows
    #[default]
    Text,
    /// Quoted CSV
    Csv,
    /// Quoted CSV served as an attachment
    File,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Structured => "structured",
            OutputFormat::Markup => "markup",
            OutputFormat::Text => "text",
            OutputFormat::Csv => "csv",
            OutputFormat::File => "file",
        }
    }

    /// Content type of the rendered body
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Structured => "application/json",
            OutputFormat::Markup => "text/html; charset=utf-8",
            OutputFormat::Text => "text/plain; charset=utf-8",
            OutputFormat::Csv | OutputFormat::File => "text/csv; charset=utf-8",
        }
    }

    /// Parse an optional wire value; blank means the default
    pub fn parse_opt(raw: Option<&str>) -> Result<Self, QueryError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(OutputFormat::default()),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" | "structured" => Ok(OutputFormat::Structured),
            "html" | "markup" => Ok(OutputFormat::Markup),
            "text" => Ok(OutputFormat::Text),
            "csv" => Ok(OutputFormat::Csv),
            "file" => Ok(OutputFormat::File),
            _ => Err(QueryError::unsupported_format(s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows returned by the warehouse
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Column names in projected order
    pub columns: Vec<String>,
    /// Rows; each row holds one value per column
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Result with columns and no rows
    pub fn empty(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as ordered JSON objects
    pub fn records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = Map::new();
                for (i, column) in self.columns.iter().enumerate() {
                    record.insert(column.clone(), row.get(i).cloned().unwrap_or(Value::Null));
                }
                Value::Object(record)
            })
            .collect()
    }
}

/// A rendered response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub format: OutputFormat,
    pub content_type: &'static str,
    pub body: String,
    /// Attachment filename, set for [`OutputFormat::File`]
    pub filename: Option<String>,
}

/// Render rows. `title` names the document and the attachment.
pub fn render(result: &ResultSet, format: OutputFormat, title: &str) -> Rendered {
    let body = match format {
        OutputFormat::Structured => Value::Array(result.records()).to_string(),
        OutputFormat::Markup => render_html(result, title),
        OutputFormat::Text => render_text(result),
        OutputFormat::Csv | OutputFormat::File => render_csv(result),
    };
    finish(format, body, title)
}

/// Render a count-only result
pub fn render_count(count: i64, format: OutputFormat, title: &str) -> Rendered {
    match format {
        OutputFormat::Structured => {
            let mut record = Map::new();
            record.insert("count".to_string(), Value::from(count));
            finish(format, Value::Object(record).to_string(), title)
        }
        _ => render(
            &ResultSet::new(vec!["count".to_string()], vec![vec![Value::from(count)]]),
            format,
            title,
        ),
    }
}

fn finish(format: OutputFormat, body: String, title: &str) -> Rendered {
    Rendered {
        format,
        content_type: format.content_type(),
        body,
        filename: (format == OutputFormat::File).then(|| format!("{}.csv", title)),
    }
}

/// Plain text form of a cell
fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn render_text(result: &ResultSet) -> String {
    let mut out = result.columns.join(",");
    out.push('\n');
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

fn csv_field(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}

fn render_csv(result: &ResultSet) -> String {
    let mut out = String::new();
    let header: Vec<String> = result.columns.iter().map(|c| csv_field(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in &result.rows {
        let cells: Vec<String> = row.iter().map(|v| csv_field(&cell_text(v))).collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render_html(result: &ResultSet, title: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    out.push_str("</head>\n<body>\n<table>\n<thead>\n<tr>");
    for column in &result.columns {
        out.push_str(&format!("<th>{}</th>", escape_html(column)));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in &result.rows {
        out.push_str("<tr>");
        for value in row {
            out.push_str(&format!("<td>{}</td>", escape_html(&cell_text(value))));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    out
}
