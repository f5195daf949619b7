//! Error types for XML binding.
//!
//! Every failure of a serialize or parse call is reported as an [`XmlBindError`].
//! Callers that need to translate errors into protocol faults should match on
//! [`XmlBindError::kind`] rather than on the individual variants.

use std::fmt;
use std::io;

use crate::schema::QName;

/// Errors that can occur while building schemas or (de)serializing records.
#[derive(Debug, thiserror::Error)]
pub enum XmlBindError {
    /// A required field had no value.
    #[error("missing required field {field} in {record}")]
    MissingRequiredField {
        /// Type name of the record being processed.
        record: QName,
        /// Qualified name of the missing field.
        field: QName,
    },

    /// The element found does not fit the schema at the current position.
    #[error("unexpected element {found}, expected {expected}")]
    UnexpectedElement {
        /// What the schema allowed at this position.
        expected: String,
        /// What the document contained.
        found: String,
    },

    /// An element remained after every field of the record was processed.
    #[error("unexpected trailing element {element} in {record}")]
    UnexpectedTrailingElement {
        /// Type name of the record being parsed.
        record: QName,
        /// Name of the element that was left over.
        element: QName,
    },

    /// Text content could not be converted to the field's semantic type.
    #[error("invalid {expected} value {value:?} for {field}: {reason}")]
    TypeConversion {
        /// Field whose content was malformed.
        field: QName,
        /// Name of the expected semantic type.
        expected: &'static str,
        /// The offending text.
        value: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// No schema is registered under the given type name.
    #[error("unknown type {0}")]
    UnknownType(QName),

    /// An abstract type was used without a concrete `xsi:type` substitution.
    #[error("abstract type {0} requires an xsi:type substitution")]
    AbstractType(QName),

    /// An `xsi:type` named a registered type that does not derive from the declared one.
    #[error("type {actual} cannot substitute for {expected}")]
    InvalidSubstitution {
        /// Statically declared type.
        expected: QName,
        /// Type announced by `xsi:type`.
        actual: QName,
    },

    /// Record nesting exceeded the configured limit.
    #[error("record nesting exceeds the limit of {0}")]
    DepthLimitExceeded(usize),

    /// An MTOM/XOP reference pointed at an attachment that was not supplied.
    #[error("unresolved attachment reference: {0}")]
    UnresolvedAttachment(String),

    /// The document is not well-formed or uses constructs the codec cannot read.
    #[error("malformed XML: {0}")]
    Malformed(String),

    /// The record schema does not declare a field with this name.
    #[error("record {record} has no field named {field}")]
    UnknownField {
        /// Type name of the record.
        record: QName,
        /// The requested field name.
        field: String,
    },

    /// A value assigned to a field does not match its descriptor.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Qualified name of the field.
        field: QName,
        /// Why the value was rejected.
        reason: String,
    },

    /// A type with the same name is already registered.
    #[error("type {0} is already registered")]
    DuplicateType(QName),

    /// A schema failed structural validation.
    #[error("invalid schema for {record}: {reason}")]
    InvalidSchema {
        /// Type name of the offending schema.
        record: QName,
        /// The violated rule.
        reason: String,
    },

    /// An I/O error from the underlying writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An error from the underlying quick-xml library.
    #[error("XML processing error: {0}")]
    QuickXml(#[from] quick_xml::Error),

    /// An error from quick-xml attribute handling.
    #[error("XML attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
}

/// Coarse classification of [`XmlBindError`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required field was absent.
    MissingRequiredField,
    /// The document structure did not match the schema.
    UnexpectedElement,
    /// Extra content followed the last field of a record.
    UnexpectedTrailingElement,
    /// Malformed primitive text.
    TypeConversion,
    /// Polymorphic resolution failed.
    UnknownType,
    /// The underlying stream failed or was not well-formed XML.
    Stream,
    /// Application code assigned or requested something the schema forbids.
    InvalidValue,
    /// Schema or registry setup is inconsistent.
    Configuration,
}

impl ErrorKind {
    /// Returns the SOAP 1.1 fault code a transport should report for this kind.
    ///
    /// Payload problems are the sender's fault (`Client`); configuration and
    /// application-side misuse are reported as `Server`.
    #[must_use]
    pub fn fault_code(self) -> &'static str {
        match self {
            Self::InvalidValue | Self::Configuration => "Server",
            _ => "Client",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingRequiredField => "MissingRequiredField",
            Self::UnexpectedElement => "UnexpectedElement",
            Self::UnexpectedTrailingElement => "UnexpectedTrailingElement",
            Self::TypeConversion => "TypeConversionError",
            Self::UnknownType => "UnknownType",
            Self::Stream => "StreamError",
            Self::InvalidValue => "InvalidValue",
            Self::Configuration => "ConfigurationError",
        };
        f.write_str(s)
    }
}

impl XmlBindError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingRequiredField { .. } => ErrorKind::MissingRequiredField,
            Self::UnexpectedElement { .. }
            | Self::InvalidSubstitution { .. }
            | Self::DepthLimitExceeded(_) => ErrorKind::UnexpectedElement,
            Self::UnexpectedTrailingElement { .. } => ErrorKind::UnexpectedTrailingElement,
            Self::TypeConversion { .. } => ErrorKind::TypeConversion,
            Self::UnknownType(_) | Self::AbstractType(_) => ErrorKind::UnknownType,
            Self::UnresolvedAttachment(_)
            | Self::Malformed(_)
            | Self::Io(_)
            | Self::QuickXml(_)
            | Self::Attribute(_) => ErrorKind::Stream,
            Self::UnknownField { .. } | Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::DuplicateType(_) | Self::InvalidSchema { .. } => ErrorKind::Configuration,
        }
    }

    pub(crate) fn unexpected(expected: impl fmt::Display, found: impl fmt::Display) -> Self {
        Self::UnexpectedElement {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

/// Convenience result type for XML binding operations.
pub type XmlBindResult<T> = Result<T, XmlBindError>;
