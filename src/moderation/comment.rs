//! # Comment Documents
//!
//! A submitted comment is a JSON object. Private comments (`isPublic` false)
//! never have their author's name or email written to the warehouse.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::query::SqlValue;

use super::errors::{ModerationError, ModerationResult};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Reviewer recorded when none is supplied
pub const UNKNOWN_REVIEWER: &str = "Unknown";

/// A parsed comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Submission time, truncated to seconds
    pub created: String,
    pub dashboard: String,
    pub table: String,
    pub subject: String,
    pub message: String,
    #[serde(rename = "isPublic")]
    pub is_public: bool,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Comment {
    /// Parse and validate a comment document
    pub fn from_json(data: &[u8]) -> ModerationResult<Self> {
        let value: Value = serde_json::from_slice(data)
            .map_err(|e| ModerationError::InvalidComment(format!("not valid JSON: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| ModerationError::InvalidComment("expected a JSON object".into()))?;

        Ok(Self {
            created: normalize_timestamp(&required(object, "created")?)?,
            dashboard: required(object, "dashboard")?,
            table: required(object, "table")?,
            subject: required(object, "subject")?,
            message: required(object, "message")?,
            is_public: flag(object, "isPublic")?,
            name: optional(object, "name"),
            email: optional(object, "email"),
        })
    }

    /// Column values for the comments table
    pub fn to_row(
        &self,
        approved: DateTime<Utc>,
        reviewer: Option<&str>,
    ) -> Vec<(&'static str, SqlValue)> {
        let personal = |value: &Option<String>| match (self.is_public, value) {
            (true, Some(v)) => SqlValue::Text(v.clone()),
            _ => SqlValue::Null,
        };
        let reviewer = reviewer
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(UNKNOWN_REVIEWER);

        vec![
            ("created", SqlValue::Text(self.created.clone())),
            (
                "approved",
                SqlValue::Text(approved.format(TIMESTAMP_FORMAT).to_string()),
            ),
            ("dashboard", SqlValue::Text(self.dashboard.clone())),
            ("table", SqlValue::Text(self.table.clone())),
            ("subject", SqlValue::Text(self.subject.clone())),
            ("message", SqlValue::Text(self.message.clone())),
            ("name", personal(&self.name)),
            ("email", personal(&self.email)),
            ("isPublic", SqlValue::Boolean(self.is_public)),
            ("reviewer", SqlValue::Text(reviewer.to_string())),
        ]
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn required(object: &Map<String, Value>, field: &str) -> ModerationResult<String> {
    object
        .get(field)
        .and_then(text_of)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ModerationError::InvalidComment(format!("missing field '{}'", field)))
}

fn optional(object: &Map<String, Value>, field: &str) -> Option<String> {
    object
        .get(field)
        .and_then(text_of)
        .filter(|s| !s.trim().is_empty())
}

/// Accepts JSON booleans and the strings `true`/`false` in any case
fn flag(object: &Map<String, Value>, field: &str) -> ModerationResult<bool> {
    match object.get(field) {
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
        Some(_) => Err(ModerationError::InvalidComment(format!(
            "field '{}' must be true or false",
            field
        ))),
        None => Err(ModerationError::InvalidComment(format!("missing field '{}'", field))),
    }
}

/// Truncate to whole seconds and normalize the date/time separator
fn normalize_timestamp(raw: &str) -> ModerationResult<String> {
    let head: String = raw.trim().chars().take(19).collect::<String>().replacen('T', " ", 1);
    NaiveDateTime::parse_from_str(&head, TIMESTAMP_FORMAT)
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .map_err(|_| ModerationError::InvalidComment(format!("bad timestamp '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn document(is_public: Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "created": "2024-03-05T10:11:12.345678",
            "dashboard": "Population",
            "table": "livestock_countries_population_faostat",
            "subject": "Numbers look off",
            "message": "2019 goats for Ethiopia double counted",
            "isPublic": is_public,
            "name": "A. Reviewer",
            "email": "a@example.org"
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_truncates_created() {
        let comment = Comment::from_json(&document(Value::Bool(true))).unwrap();
        assert_eq!(comment.created, "2024-03-05 10:11:12");
        assert!(comment.is_public);
    }

    #[test]
    fn test_string_flag() {
        let comment = Comment::from_json(&document(Value::String("False".into()))).unwrap();
        assert!(!comment.is_public);
    }

    #[test]
    fn test_private_comment_row_hides_identity() {
        let comment = Comment::from_json(&document(Value::Bool(false))).unwrap();
        let approved = Utc.with_ymd_and_hms(2024, 3, 6, 8, 0, 0).unwrap();
        let row = comment.to_row(approved, None);

        let get = |name: &str| row.iter().find(|(c, _)| *c == name).unwrap().1.clone();
        assert_eq!(get("name"), SqlValue::Null);
        assert_eq!(get("email"), SqlValue::Null);
        assert_eq!(get("reviewer"), SqlValue::Text("Unknown".into()));
        assert_eq!(get("approved"), SqlValue::Text("2024-03-06 08:00:00".into()));
        assert_eq!(get("isPublic"), SqlValue::Boolean(false));
    }

    #[test]
    fn test_public_comment_row() {
        let comment = Comment::from_json(&document(Value::Bool(true))).unwrap();
        let row = comment.to_row(Utc::now(), Some("moderator"));
        assert!(row.contains(&("name", SqlValue::Text("A. Reviewer".into()))));
        assert!(row.contains(&("reviewer", SqlValue::Text("moderator".into()))));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(Comment::from_json(b"not json").is_err());
        assert!(Comment::from_json(b"[1,2]").is_err());
        assert!(Comment::from_json(br#"{"created": "2024-01-01 00:00:00"}"#).is_err());

        let mut bad_time: Value = serde_json::from_slice(&document(Value::Bool(true))).unwrap();
        bad_time["created"] = Value::String("yesterday".into());
        let err = Comment::from_json(&serde_json::to_vec(&bad_time).unwrap()).unwrap_err();
        assert!(matches!(err, ModerationError::InvalidComment(_)));
    }
}
