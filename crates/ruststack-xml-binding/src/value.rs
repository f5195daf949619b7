//! Field values and their canonical text forms.
//!
//! Conventions on the wire:
//!
//! - Booleans: lowercase `true`/`false` (`1`/`0` are accepted when parsing)
//! - Integers: decimal
//! - Timestamps: ISO 8601 format (`2006-02-03T16:45:09.000Z`)
//! - Binary: base64 text unless sent as an MTOM attachment

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use chrono::{DateTime, Timelike, Utc};

use crate::record::Record;
use crate::schema::FieldType;

/// A value held by a record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text, also used for enumeration values.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// A 32-bit integer.
    Int(i32),
    /// A 64-bit integer.
    Long(i64),
    /// A point in time.
    Timestamp(DateTime<Utc>),
    /// Opaque binary content.
    Binary(Bytes),
    /// A nested record, possibly of a subtype of the field's declared type.
    Record(Box<Record>),
    /// The occurrences of a repeated field, in document order.
    Array(Vec<Value>),
    /// An explicit `xsi:nil="true"`.
    Nil,
}

impl Value {
    /// Build an array value from anything convertible to values.
    pub fn array<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// The string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer, if this is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// The integer, if this is a `Long`.
    #[must_use]
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(n) => Some(*n),
            _ => None,
        }
    }

    /// The timestamp, if this is a timestamp.
    #[must_use]
    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// The bytes, if this is binary content.
    #[must_use]
    pub fn as_binary(&self) -> Option<&Bytes> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// The nested record, if this is a record.
    #[must_use]
    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// The items, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether this is an explicit nil.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Short name of the variant used in diagnostics.
    #[must_use]
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Timestamp(_) => "dateTime",
            Self::Binary(_) => "base64Binary",
            Self::Record(_) => "record",
            Self::Array(_) => "array",
            Self::Nil => "nil",
        }
    }

    /// Canonical text for primitive values; `None` for records, arrays, nil and binary.
    #[must_use]
    pub fn to_lexical(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Boolean(b) => Some(if *b { "true" } else { "false" }.to_owned()),
            Self::Int(n) => Some(n.to_string()),
            Self::Long(n) => Some(n.to_string()),
            Self::Timestamp(t) => Some(format_timestamp(t)),
            Self::Binary(_) | Self::Record(_) | Self::Array(_) | Self::Nil => None,
        }
    }

    /// Parse text content according to a primitive field type.
    ///
    /// Returns a human-readable reason on failure; the caller attaches the field name.
    pub(crate) fn from_lexical(field_type: &FieldType, text: &str) -> Result<Self, String> {
        match field_type {
            FieldType::String => Ok(Self::String(text.to_owned())),
            FieldType::Enumeration(allowed) => {
                if allowed.contains(&text) {
                    Ok(Self::String(text.to_owned()))
                } else {
                    Err(format!("expected one of {allowed:?}"))
                }
            }
            FieldType::Boolean => parse_bool(text.trim()).map(Self::Boolean),
            FieldType::Int => text
                .trim()
                .parse::<i32>()
                .map(Self::Int)
                .map_err(|e| e.to_string()),
            FieldType::Long => text
                .trim()
                .parse::<i64>()
                .map(Self::Long)
                .map_err(|e| e.to_string()),
            FieldType::Timestamp => parse_timestamp(text.trim()).map(Self::Timestamp),
            FieldType::Binary => decode_base64(text).map(Self::Binary),
            FieldType::Record(_) => Err("records have no text form".to_owned()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Long(n)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Timestamp(t)
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Self::Binary(b)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Self::Record(Box::new(r))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

/// Format a `DateTime<Utc>` as ISO 8601 with a `Z` suffix.
///
/// Whole-millisecond values keep the three-digit form; finer values are
/// written with enough digits to parse back unchanged.
#[must_use]
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    if dt.nanosecond() % 1_000_000 == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.fZ").to_string()
    }
}

/// Parse an ISO 8601 timestamp.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Timestamps without an offset are taken as UTC.
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").map(|ndt| ndt.and_utc())
        })
        .map_err(|e| e.to_string())
}

/// Parse an `xs:boolean`.
fn parse_bool(s: &str) -> Result<bool, String> {
    match s {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err("expected true, false, 1 or 0".to_owned()),
    }
}

/// Encode bytes as base64 text.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decode base64 text, ignoring embedded whitespace.
fn decode_base64(text: &str) -> Result<Bytes, String> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64
        .decode(compact.as_bytes())
        .map(Bytes::from)
        .map_err(|e| e.to_string())
}
