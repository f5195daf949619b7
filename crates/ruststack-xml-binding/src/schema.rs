//! Schema model: ordered field descriptions for record types.
//!
//! A [`RecordSchema`] is a build-time description of one complex type: its
//! qualified type name, the types it derives from, and an ordered list of
//! [`FieldDescriptor`]s. Schemas carry no behavior of their own; the codec in
//! [`crate::serialize`] and [`crate::deserialize`] walks them field by field.

use std::borrow::Cow;
use std::fmt;

/// XML Schema instance namespace (`xsi:type`, `xsi:nil`).
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XOP namespace used for MTOM attachment references.
pub const XOP_NAMESPACE: &str = "http://www.w3.org/2004/08/xop/include";

/// A namespace-qualified XML name.
///
/// Displays in Clark notation (`{namespace}local`), or as the bare local name
/// when the namespace is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    namespace: Cow<'static, str>,
    local_name: Cow<'static, str>,
}

impl QName {
    /// Create a name from static strings. Usable in `const` contexts.
    #[must_use]
    pub const fn from_static(namespace: &'static str, local_name: &'static str) -> Self {
        Self {
            namespace: Cow::Borrowed(namespace),
            local_name: Cow::Borrowed(local_name),
        }
    }

    /// Create a name from owned or borrowed strings.
    #[must_use]
    pub fn new(
        namespace: impl Into<Cow<'static, str>>,
        local_name: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    /// The namespace URI, empty for unqualified names.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The local part of the name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// Whether this name matches the given namespace and local name.
    #[must_use]
    pub fn matches(&self, namespace: &str, local_name: &str) -> bool {
        self.namespace == namespace && self.local_name == local_name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_name)
        }
    }
}

/// The semantic type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// `xs:string`.
    String,
    /// `xs:boolean`, written as `true`/`false`.
    Boolean,
    /// `xs:int`.
    Int,
    /// `xs:long`.
    Long,
    /// `xs:dateTime`, written as ISO 8601 in UTC.
    Timestamp,
    /// `xs:base64Binary`, inline or as an MTOM attachment.
    Binary,
    /// A string restricted to a fixed set of values.
    Enumeration(&'static [&'static str]),
    /// A nested record of the given (static) type.
    Record(QName),
}

impl FieldType {
    /// Short name of the type used in diagnostics.
    #[must_use]
    pub fn type_label(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Timestamp => "dateTime",
            Self::Binary => "base64Binary",
            Self::Enumeration(_) => "enumeration",
            Self::Record(_) => "record",
        }
    }
}

/// Whether a field must be present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Occurrence {
    /// The field must carry a value (`minOccurs="1"`).
    Required,
    /// The field may be omitted (`minOccurs="0"`).
    #[default]
    Optional,
}

/// Description of one field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: QName,
    field_type: FieldType,
    occurrence: Occurrence,
    repeated: bool,
    nillable: bool,
    choice_group: Option<u32>,
}

impl FieldDescriptor {
    /// A field that must be present.
    #[must_use]
    pub fn required(name: QName, field_type: FieldType) -> Self {
        Self::new(name, field_type, Occurrence::Required)
    }

    /// A field that may be omitted.
    #[must_use]
    pub fn optional(name: QName, field_type: FieldType) -> Self {
        Self::new(name, field_type, Occurrence::Optional)
    }

    fn new(name: QName, field_type: FieldType, occurrence: Occurrence) -> Self {
        Self {
            name,
            field_type,
            occurrence,
            repeated: false,
            nillable: false,
            choice_group: None,
        }
    }

    /// Mark the field as an array encoded as repeated sibling elements.
    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Allow `xsi:nil="true"` for this field.
    #[must_use]
    pub fn nillable(mut self) -> Self {
        self.nillable = true;
        self
    }

    /// Put the field into a choice group; at most one member may be set.
    #[must_use]
    pub fn in_choice(mut self, group: u32) -> Self {
        self.choice_group = Some(group);
        self
    }

    /// Qualified element name.
    #[must_use]
    pub fn name(&self) -> &QName {
        &self.name
    }

    /// Local element name, used as the field key on records.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.name.local_name()
    }

    /// Semantic type of a single occurrence.
    #[must_use]
    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Whether the field is `required`.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.occurrence == Occurrence::Required
    }

    /// Whether the field holds an array.
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Whether the field accepts `xsi:nil`.
    #[must_use]
    pub fn is_nillable(&self) -> bool {
        self.nillable
    }

    /// Choice group id, if any.
    #[must_use]
    pub fn choice_group(&self) -> Option<u32> {
        self.choice_group
    }
}

/// Ordered description of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    type_name: QName,
    ancestors: Vec<QName>,
    is_abstract: bool,
    fields: Vec<FieldDescriptor>,
}

impl RecordSchema {
    /// Start a schema for a type with no base type.
    #[must_use]
    pub fn builder(type_name: QName) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            schema: Self {
                type_name,
                ancestors: Vec::new(),
                is_abstract: false,
                fields: Vec::new(),
            },
        }
    }

    /// Start a schema for a type that extends `base`.
    ///
    /// The base fields come first, followed by the fields added on the builder.
    #[must_use]
    pub fn extending(type_name: QName, base: &Self) -> RecordSchemaBuilder {
        let mut ancestors = Vec::with_capacity(base.ancestors.len() + 1);
        ancestors.push(base.type_name.clone());
        ancestors.extend(base.ancestors.iter().cloned());
        RecordSchemaBuilder {
            schema: Self {
                type_name,
                ancestors,
                is_abstract: false,
                fields: base.fields.clone(),
            },
        }
    }

    /// The qualified type name.
    #[must_use]
    pub fn type_name(&self) -> &QName {
        &self.type_name
    }

    /// Base types, nearest first.
    #[must_use]
    pub fn ancestors(&self) -> &[QName] {
        &self.ancestors
    }

    /// Whether instances of exactly this type may appear on the wire.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Fields in declared order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Whether this type is `other` or derives from it.
    #[must_use]
    pub fn is_a(&self, other: &QName) -> bool {
        self.type_name == *other || self.ancestors.contains(other)
    }

    /// Position of the field with the given local name.
    #[must_use]
    pub fn field_index(&self, local_name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.local_name() == local_name)
    }

    /// The field with the given local name.
    #[must_use]
    pub fn field(&self, local_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.local_name() == local_name)
    }

    /// Check the structural rules a schema must satisfy before registration.
    ///
    /// Local field names must be unique since records address fields by local
    /// name. Choice-group members must be optional, and the members of one
    /// choice group must be declared next to each other.
    pub(crate) fn validate(&self) -> Result<(), String> {
        for (i, field) in self.fields.iter().enumerate() {
            if let Some(earlier) = self.fields[..i]
                .iter()
                .find(|f| f.local_name() == field.local_name())
            {
                return Err(format!(
                    "duplicate field {} (already declared as {})",
                    field.name, earlier.name
                ));
            }
            let Some(group) = field.choice_group else {
                continue;
            };
            if field.is_required() {
                return Err(format!(
                    "choice group {group} member {} must be optional",
                    field.name
                ));
            }
            let previous = self.fields[..i]
                .iter()
                .rposition(|f| f.choice_group == Some(group));
            if let Some(p) = previous {
                if p + 1 != i {
                    return Err(format!(
                        "choice group {group} members must be contiguous, {} is not",
                        field.name
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Builder for [`RecordSchema`].
#[derive(Debug)]
pub struct RecordSchemaBuilder {
    schema: RecordSchema,
}

impl RecordSchemaBuilder {
    /// Append a field.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.schema.fields.push(field);
        self
    }

    /// Append several fields in order.
    #[must_use]
    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.schema.fields.extend(fields);
        self
    }

    /// Mark the type abstract.
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.schema.is_abstract = true;
        self
    }

    /// Finish the schema.
    #[must_use]
    pub fn build(self) -> RecordSchema {
        self.schema
    }
}
