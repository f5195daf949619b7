//! Record instances: field values plus presence trackers.
//!
//! A [`Record`] holds one slot per schema field. An empty slot means the field
//! is untracked and will be omitted on the wire; a filled slot is emitted even
//! when it holds an "empty" value such as `""`, `0` or an empty array.

use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::XmlBindError;
use crate::registry::TypeRegistry;
use crate::schema::{FieldDescriptor, FieldType, QName, RecordSchema};
use crate::value::{Value, encode_base64, format_timestamp};

/// An instance of a record type.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Arc<RecordSchema>,
    values: Vec<Option<Value>>,
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema.type_name() == other.schema.type_name() && self.values == other.values
    }
}

impl Record {
    /// Create a record with every field untracked.
    #[must_use]
    pub fn new(schema: Arc<RecordSchema>) -> Self {
        let values = vec![None; schema.fields().len()];
        Self { schema, values }
    }

    /// The schema of the concrete type.
    #[must_use]
    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    /// The concrete type name.
    #[must_use]
    pub fn type_name(&self) -> &QName {
        self.schema.type_name()
    }

    /// Set a field, marking it as tracked.
    ///
    /// Setting a choice-group member clears the other members of its group.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` if the schema has no such field and `InvalidValue`
    /// if the value does not match the field descriptor.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<&mut Self, XmlBindError> {
        let index = self.index_of(field)?;
        let value = value.into();
        check_field_value(&self.schema.fields()[index], &value)?;
        self.store(index, value);
        Ok(self)
    }

    /// Set a field when `value` is `Some`, clear it when `None`.
    ///
    /// # Errors
    ///
    /// Same as [`Record::set`].
    pub fn set_optional<T: Into<Value>>(
        &mut self,
        field: &str,
        value: Option<T>,
    ) -> Result<&mut Self, XmlBindError> {
        match value {
            Some(v) => self.set(field, v),
            None => {
                self.clear(field)?;
                Ok(self)
            }
        }
    }

    /// Builder-style [`Record::set`].
    ///
    /// # Errors
    ///
    /// Same as [`Record::set`].
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Result<Self, XmlBindError> {
        self.set(field, value)?;
        Ok(self)
    }

    /// Clear a field's value and tracker.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` if the schema has no such field.
    pub fn clear(&mut self, field: &str) -> Result<(), XmlBindError> {
        let index = self.index_of(field)?;
        self.values[index] = None;
        Ok(())
    }

    /// The value of a field, `None` when untracked.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` if the schema has no such field.
    pub fn get(&self, field: &str) -> Result<Option<&Value>, XmlBindError> {
        let index = self.index_of(field)?;
        Ok(self.values[index].as_ref())
    }

    /// Whether a field is tracked.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` if the schema has no such field.
    pub fn is_set(&self, field: &str) -> Result<bool, XmlBindError> {
        self.get(field).map(|v| v.is_some())
    }

    /// Fields in schema order paired with their values.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, Option<&Value>)> {
        self.schema
            .fields()
            .iter()
            .zip(self.values.iter().map(Option::as_ref))
    }

    /// Local names of the tracked fields in schema order.
    #[must_use]
    pub fn tracked_fields(&self) -> Vec<&str> {
        self.fields()
            .filter(|(_, v)| v.is_some())
            .map(|(f, _)| f.local_name())
            .collect()
    }

    pub(crate) fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// Store a value the parser already validated.
    pub(crate) fn store(&mut self, index: usize, value: Value) {
        if let Some(group) = self.schema.fields()[index].choice_group() {
            for (i, f) in self.schema.fields().iter().enumerate() {
                if i != index && f.choice_group() == Some(group) {
                    self.values[i] = None;
                }
            }
        }
        self.values[index] = Some(value);
    }

    fn index_of(&self, field: &str) -> Result<usize, XmlBindError> {
        self.schema
            .field_index(field)
            .ok_or_else(|| XmlBindError::UnknownField {
                record: self.schema.type_name().clone(),
                field: field.to_owned(),
            })
    }
}

/// Check that `value` fits `field`.
fn check_field_value(field: &FieldDescriptor, value: &Value) -> Result<(), XmlBindError> {
    let invalid = |reason: String| XmlBindError::InvalidValue {
        field: field.name().clone(),
        reason,
    };
    if field.is_repeated() {
        let Value::Array(items) = value else {
            return Err(invalid(format!(
                "repeated field needs an array, got {}",
                value.kind_label()
            )));
        };
        return items
            .iter()
            .try_for_each(|item| check_single_value(field, item).map_err(invalid));
    }
    check_single_value(field, value).map_err(invalid)
}

fn check_single_value(field: &FieldDescriptor, value: &Value) -> Result<(), String> {
    let ok = match (field.field_type(), value) {
        (_, Value::Nil) => field.is_nillable(),
        (FieldType::String, Value::String(_))
        | (FieldType::Boolean, Value::Boolean(_))
        | (FieldType::Int, Value::Int(_))
        | (FieldType::Long, Value::Long(_))
        | (FieldType::Timestamp, Value::Timestamp(_))
        | (FieldType::Binary, Value::Binary(_)) => true,
        (FieldType::Enumeration(allowed), Value::String(s)) => {
            if !allowed.contains(&s.as_str()) {
                return Err(format!("{s:?} is not one of {allowed:?}"));
            }
            true
        }
        (FieldType::Record(declared), Value::Record(r)) => {
            if !r.schema().is_a(declared) {
                return Err(format!("{} does not derive from {declared}", r.type_name()));
            }
            true
        }
        _ => false,
    };
    if ok {
        Ok(())
    } else if value.is_nil() {
        Err("field is not nillable".to_owned())
    } else {
        Err(format!(
            "expected {}, got {}",
            field.field_type().type_label(),
            value.kind_label()
        ))
    }
}

/// A typed struct bound to a registered record type.
pub trait XmlRecord: Sized {
    /// Name of the schema this type binds to.
    fn schema_type() -> QName;

    /// Convert into a generic record using the registered schema.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if the schema is not registered, or any error from
    /// [`Record::set`].
    fn to_record(&self, registry: &TypeRegistry) -> Result<Record, XmlBindError>;

    /// Build from a generic record.
    ///
    /// # Errors
    ///
    /// Returns `MissingRequiredField` or `InvalidValue` when the record does not
    /// carry what the struct needs.
    fn from_record(record: &Record) -> Result<Self, XmlBindError>;
}

// ---------------------------------------------------------------------------
// serde output for tooling
// ---------------------------------------------------------------------------

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RecordView {
            record: self,
            type_tag: None,
        }
        .serialize(serializer)
    }
}

struct RecordView<'a> {
    record: &'a Record,
    type_tag: Option<&'a QName>,
}

impl Serialize for RecordView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(tag) = self.type_tag {
            map.serialize_entry("@type", tag.local_name())?;
        }
        for (field, value) in self.record.fields() {
            if let Some(value) = value {
                map.serialize_entry(field.local_name(), &FieldValueView { field, value })?;
            }
        }
        map.end()
    }
}

struct FieldValueView<'a> {
    field: &'a FieldDescriptor,
    value: &'a Value,
}

impl Serialize for FieldValueView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::String(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i32(*n),
            Value::Long(n) => serializer.serialize_i64(*n),
            Value::Timestamp(t) => serializer.serialize_str(&format_timestamp(t)),
            Value::Binary(b) => serializer.serialize_str(&encode_base64(b)),
            Value::Nil => serializer.serialize_unit(),
            Value::Record(r) => {
                let type_tag = match self.field.field_type() {
                    FieldType::Record(declared) if declared != r.type_name() => {
                        Some(r.type_name())
                    }
                    _ => None,
                };
                RecordView {
                    record: r,
                    type_tag,
                }
                .serialize(serializer)
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(&FieldValueView {
                        field: self.field,
                        value: item,
                    })?;
                }
                seq.end()
            }
        }
    }
}
