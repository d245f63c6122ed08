//! Database value enumeration shared by fields, payloads, filters and rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value as JsonValue;

/// Closed set of values that flow between callers, field parsers and drivers
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl DatabaseValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Short name of the variant, used in log and error messages
    pub fn kind(&self) -> &'static str {
        match self {
            DatabaseValue::Null => "null",
            DatabaseValue::Bool(_) => "bool",
            DatabaseValue::Integer(_) => "integer",
            DatabaseValue::Float(_) => "float",
            DatabaseValue::String(_) => "string",
            DatabaseValue::Date(_) => "date",
            DatabaseValue::DateTime(_) => "datetime",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DatabaseValue::Integer(i) => Some(*i),
            DatabaseValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DatabaseValue::Float(f) => Some(*f),
            DatabaseValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DatabaseValue::Bool(b) => Some(*b),
            DatabaseValue::Integer(0) => Some(false),
            DatabaseValue::Integer(1) => Some(true),
            _ => None,
        }
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> JsonValue {
        match self {
            DatabaseValue::Null => JsonValue::Null,
            DatabaseValue::Bool(b) => JsonValue::Bool(*b),
            DatabaseValue::Integer(i) => JsonValue::Number(serde_json::Number::from(*i)),
            DatabaseValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            DatabaseValue::String(s) => JsonValue::String(s.clone()),
            DatabaseValue::Date(d) => JsonValue::String(d.to_string()),
            DatabaseValue::DateTime(dt) => JsonValue::String(dt.to_rfc3339()),
        }
    }

    /// Create DatabaseValue from JSON value
    ///
    /// Strings stay strings; dates are only produced by the date field parsers.
    /// Arrays and objects are kept as their JSON text.
    pub fn from_json(json: JsonValue) -> Self {
        match json {
            JsonValue::Null => DatabaseValue::Null,
            JsonValue::Bool(b) => DatabaseValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DatabaseValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    DatabaseValue::Float(f)
                } else {
                    DatabaseValue::Null
                }
            }
            JsonValue::String(s) => DatabaseValue::String(s),
            other @ (JsonValue::Array(_) | JsonValue::Object(_)) => {
                DatabaseValue::String(other.to_string())
            }
        }
    }
}

impl std::fmt::Display for DatabaseValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseValue::Null => write!(f, "NULL"),
            DatabaseValue::Bool(b) => write!(f, "{}", b),
            DatabaseValue::Integer(i) => write!(f, "{}", i),
            DatabaseValue::Float(v) => write!(f, "{}", v),
            DatabaseValue::String(s) => write!(f, "{}", s),
            DatabaseValue::Date(d) => write!(f, "{}", d),
            DatabaseValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
        }
    }
}

impl From<bool> for DatabaseValue {
    fn from(value: bool) -> Self {
        DatabaseValue::Bool(value)
    }
}

impl From<i32> for DatabaseValue {
    fn from(value: i32) -> Self {
        DatabaseValue::Integer(i64::from(value))
    }
}

impl From<i64> for DatabaseValue {
    fn from(value: i64) -> Self {
        DatabaseValue::Integer(value)
    }
}

impl From<u32> for DatabaseValue {
    fn from(value: u32) -> Self {
        DatabaseValue::Integer(i64::from(value))
    }
}

impl From<f32> for DatabaseValue {
    fn from(value: f32) -> Self {
        DatabaseValue::Float(f64::from(value))
    }
}

impl From<f64> for DatabaseValue {
    fn from(value: f64) -> Self {
        DatabaseValue::Float(value)
    }
}

impl From<String> for DatabaseValue {
    fn from(value: String) -> Self {
        DatabaseValue::String(value)
    }
}

impl From<&str> for DatabaseValue {
    fn from(value: &str) -> Self {
        DatabaseValue::String(value.to_string())
    }
}

impl From<NaiveDate> for DatabaseValue {
    fn from(value: NaiveDate) -> Self {
        DatabaseValue::Date(value)
    }
}

impl From<DateTime<Utc>> for DatabaseValue {
    fn from(value: DateTime<Utc>) -> Self {
        DatabaseValue::DateTime(value)
    }
}

impl From<JsonValue> for DatabaseValue {
    fn from(value: JsonValue) -> Self {
        DatabaseValue::from_json(value)
    }
}

impl<T> From<Option<T>> for DatabaseValue
where
    T: Into<DatabaseValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DatabaseValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_numbers() {
        assert_eq!(DatabaseValue::from_json(json!(27)), DatabaseValue::Integer(27));
        assert_eq!(DatabaseValue::from_json(json!(1.5)), DatabaseValue::Float(1.5));
        assert_eq!(DatabaseValue::from_json(json!(null)), DatabaseValue::Null);
    }

    #[test]
    fn test_from_json_keeps_strings_verbatim() {
        // RFC 3339-looking text is not promoted to a datetime here.
        let value = DatabaseValue::from_json(json!("2024-01-01T00:00:00Z"));
        assert_eq!(value, DatabaseValue::String("2024-01-01T00:00:00Z".to_string()));
    }

    #[test]
    fn test_from_json_nested_becomes_text() {
        let value = DatabaseValue::from_json(json!({"a": 1}));
        assert_eq!(value, DatabaseValue::String("{\"a\":1}".to_string()));
    }

    #[test]
    fn test_option_conversion() {
        let none: Option<i64> = None;
        assert!(DatabaseValue::from(none).is_null());
        assert_eq!(DatabaseValue::from(Some("Ana")), DatabaseValue::String("Ana".to_string()));
    }

    #[test]
    fn test_to_json_dates() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(DatabaseValue::Date(date).to_json(), json!("2024-02-29"));
    }

    #[test]
    fn test_bool_integer_accessors() {
        assert_eq!(DatabaseValue::Integer(1).as_bool(), Some(true));
        assert_eq!(DatabaseValue::Bool(true).as_i64(), Some(1));
        assert_eq!(DatabaseValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(DatabaseValue::String("x".into()).as_i64(), None);
    }
}
