//! Schema-driven XML data binding for `RustStack`.
//!
//! This crate converts between typed records and their XML form with one
//! reusable algorithm instead of a hand-written parser per type. Every record
//! type is described by a [`RecordSchema`]; the codec walks that schema field
//! by field in both directions.
//!
//! # Key components
//!
//! - [`RecordSchema`] and [`FieldDescriptor`] describe record types
//! - [`TypeRegistry`] resolves `xsi:type` names to schemas for polymorphic parsing
//! - [`Record`] holds field values together with their presence trackers
//! - [`to_xml`] / [`Serializer`] write records, [`from_xml`] / [`Deserializer`] read them
//! - [`Attachments`] carries MTOM/XOP binary parts next to the XML body
//!
//! # Wire conventions
//!
//! - Element order is the schema order and is enforced on both paths
//! - Untracked optional fields are omitted; tracked empty values are written
//! - Arrays are repeated sibling elements without a wrapper
//! - Subtypes announce themselves with `xsi:type`
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use ruststack_xml_binding::{
//!     CodecConfig, FieldDescriptor, FieldType, QName, Record, RecordSchema, TypeRegistry,
//!     from_xml, to_xml,
//! };
//!
//! const NS: &str = "urn:example";
//! let name = QName::from_static(NS, "Entry");
//!
//! let mut registry = TypeRegistry::new();
//! let schema = registry
//!     .register(
//!         RecordSchema::builder(name.clone())
//!             .field(FieldDescriptor::required(QName::from_static(NS, "Name"), FieldType::String))
//!             .field(FieldDescriptor::optional(QName::from_static(NS, "Size"), FieldType::Long))
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let record = Record::new(Arc::clone(&schema)).with("Name", "photo.jpg").unwrap();
//! let config = CodecConfig::default();
//! let xml = to_xml(&record, &name, &name, &config).unwrap();
//! let parsed = from_xml(&xml, &name, &name, &registry, &config).unwrap();
//! assert_eq!(parsed, record);
//! ```

pub mod attachment;
pub mod config;
pub mod deserialize;
pub mod error;
pub mod namespace;
pub mod record;
pub mod registry;
pub mod schema;
pub mod serialize;
pub mod value;

pub use attachment::{Attachment, AttachmentSink, AttachmentSource, Attachments};
pub use config::CodecConfig;
pub use deserialize::{Deserializer, from_xml, from_xml_with_attachments, root_element_name};
pub use error::{ErrorKind, XmlBindError, XmlBindResult};
pub use namespace::NamespaceContext;
pub use record::{Record, XmlRecord};
pub use registry::{SharedTypeRegistry, TypeRegistry};
pub use schema::{
    FieldDescriptor, FieldType, Occurrence, QName, RecordSchema, RecordSchemaBuilder,
    XOP_NAMESPACE, XSI_NAMESPACE,
};
pub use serialize::{Serializer, to_xml, to_xml_with_attachments};
pub use value::{Value, encode_base64, format_timestamp};
