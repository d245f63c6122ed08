//! Field descriptors - storage type, constraints and value parsing for one
//! model attribute.
//!
//! A [`Field`] is declared without a name through one of the constructor
//! functions (`char_field`, `integer_field`, ...). The model's
//! [`FieldSet`](crate::model::FieldSet) binds it to a name, producing a
//! [`FieldDescriptor`].
//!
//! Every parser is total: values it cannot convert are passed through
//! unchanged and left for the backend to accept or reject.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

use crate::value::DatabaseValue;

/// Value transform applied to payload and filter values for one field
pub type FieldParser = Arc<dyn Fn(DatabaseValue) -> DatabaseValue + Send + Sync>;

/// Storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Date,
    DateTime,
    Boolean,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Float => write!(f, "float"),
            FieldType::Date => write!(f, "date"),
            FieldType::DateTime => write!(f, "datetime"),
            FieldType::Boolean => write!(f, "boolean"),
        }
    }
}

/// Column constraints of a field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldConstraints {
    pub not_null: bool,
    pub unique: bool,
    pub primary_key: bool,
    pub auto_increment: bool,
}

/// An unnamed field declaration
#[derive(Clone)]
pub struct Field {
    field_type: FieldType,
    constraints: FieldConstraints,
    max_length: Option<u32>,
    parser: FieldParser,
}

impl Field {
    /// Create a field of the given type with that type's default parser
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            constraints: FieldConstraints::default(),
            max_length: None,
            parser: default_parser(field_type),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.constraints.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.constraints.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.constraints.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.constraints.auto_increment = true;
        self
    }

    /// Replace all constraints at once
    pub fn with_constraints(mut self, constraints: FieldConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Replace the value parser; the parser must not fail
    pub fn with_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(DatabaseValue) -> DatabaseValue + Send + Sync + 'static,
    {
        self.parser = Arc::new(parser);
        self
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn constraints(&self) -> FieldConstraints {
        self.constraints
    }

    /// Declared maximum length for character fields
    pub fn max_length(&self) -> Option<u32> {
        self.max_length
    }

    /// Bind this declaration to an attribute name
    pub fn named(self, name: impl Into<String>) -> FieldDescriptor {
        FieldDescriptor {
            name: name.into(),
            field_type: self.field_type,
            constraints: self.constraints,
            max_length: self.max_length,
            parser: self.parser,
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("field_type", &self.field_type)
            .field("constraints", &self.constraints)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

/// A named field of a model
#[derive(Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub constraints: FieldConstraints,
    pub max_length: Option<u32>,
    parser: FieldParser,
}

impl FieldDescriptor {
    /// Apply this field's parser to a raw value
    pub fn parse(&self, value: DatabaseValue) -> DatabaseValue {
        (self.parser)(value)
    }

    /// Whether the system assigns this field's value (auto-increment primary key)
    pub fn is_system_assigned(&self) -> bool {
        self.constraints.primary_key && self.constraints.auto_increment
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("constraints", &self.constraints)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

/// Text field; `max_length` is recorded but not enforced
pub fn char_field(max_length: u32) -> Field {
    Field {
        max_length: Some(max_length),
        ..Field::new(FieldType::String)
    }
}

pub fn integer_field() -> Field {
    Field::new(FieldType::Integer)
}

pub fn float_field() -> Field {
    Field::new(FieldType::Float)
}

pub fn boolean_field() -> Field {
    Field::new(FieldType::Boolean)
}

pub fn date_field() -> Field {
    Field::new(FieldType::Date)
}

pub fn datetime_field() -> Field {
    Field::new(FieldType::DateTime)
}

/// Name of the implicit primary key
pub const ID_FIELD: &str = "id";

/// The implicit `id` field every model carries
pub(crate) fn id_field() -> FieldDescriptor {
    integer_field().primary_key().auto_increment().named(ID_FIELD)
}

fn default_parser(field_type: FieldType) -> FieldParser {
    match field_type {
        FieldType::String => Arc::new(parse_string),
        FieldType::Integer => Arc::new(parse_integer),
        FieldType::Float => Arc::new(parse_float),
        FieldType::Boolean => Arc::new(parse_boolean),
        FieldType::Date => Arc::new(parse_date),
        FieldType::DateTime => Arc::new(parse_datetime),
    }
}

fn parse_string(value: DatabaseValue) -> DatabaseValue {
    match value {
        DatabaseValue::Null | DatabaseValue::String(_) => value,
        other => DatabaseValue::String(other.to_string()),
    }
}

fn parse_integer(value: DatabaseValue) -> DatabaseValue {
    match value {
        DatabaseValue::Bool(b) => DatabaseValue::Integer(i64::from(b)),
        DatabaseValue::Float(f) if fits_i64(f) => DatabaseValue::Integer(f as i64),
        DatabaseValue::String(ref s) => match s.trim().parse::<i64>() {
            Ok(i) => DatabaseValue::Integer(i),
            Err(_) => value,
        },
        other => other,
    }
}

// Whole and inside the i64 range; `as` would saturate anything larger.
fn fits_i64(f: f64) -> bool {
    f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&f)
}

fn parse_float(value: DatabaseValue) -> DatabaseValue {
    match value {
        DatabaseValue::Integer(i) => DatabaseValue::Float(i as f64),
        DatabaseValue::String(ref s) => match s.trim().parse::<f64>() {
            Ok(f) => DatabaseValue::Float(f),
            Err(_) => value,
        },
        other => other,
    }
}

// Booleans are stored as INTEGER 0/1.
fn parse_boolean(value: DatabaseValue) -> DatabaseValue {
    match value {
        DatabaseValue::Bool(b) => DatabaseValue::Integer(i64::from(b)),
        DatabaseValue::String(ref s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => DatabaseValue::Integer(1),
            "false" | "0" => DatabaseValue::Integer(0),
            _ => value,
        },
        other => other,
    }
}

// Dates are stored as TEXT `YYYY-MM-DD`.
fn parse_date(value: DatabaseValue) -> DatabaseValue {
    match value {
        DatabaseValue::Date(d) => DatabaseValue::String(d.format("%Y-%m-%d").to_string()),
        DatabaseValue::DateTime(dt) => {
            DatabaseValue::String(dt.date_naive().format("%Y-%m-%d").to_string())
        }
        DatabaseValue::String(ref s) => match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
            Ok(d) => DatabaseValue::String(d.format("%Y-%m-%d").to_string()),
            Err(_) => value,
        },
        other => other,
    }
}

// Datetimes are stored as RFC 3339 TEXT in UTC.
fn parse_datetime(value: DatabaseValue) -> DatabaseValue {
    match value {
        DatabaseValue::DateTime(dt) => DatabaseValue::String(format_datetime(dt)),
        DatabaseValue::Date(d) => match d.and_hms_opt(0, 0, 0) {
            Some(naive) => DatabaseValue::String(format_datetime(naive.and_utc())),
            None => DatabaseValue::Date(d),
        },
        DatabaseValue::String(ref s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s.trim()) {
                DatabaseValue::String(format_datetime(dt.with_timezone(&Utc)))
            } else if let Ok(naive) = NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S") {
                DatabaseValue::String(format_datetime(naive.and_utc()))
            } else {
                value
            }
        }
        other => other,
    }
}

/// Canonical stored text of a datetime: UTC, whole seconds, `Z` suffix
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}
