//! S3 SOAP 2006-03-01 model for `RustStack`.
//!
//! This crate describes the legacy S3 SOAP API to the schema-driven codec in
//! `ruststack-xml-binding` and provides the service skeleton that connects the
//! codec to business logic.
//!
//! # Key components
//!
//! - [`register_types`] and [`register_operations`] declare every complex type
//!   and message with its WSDL field order
//! - [`build_registry`] assembles a closed [`TypeRegistry`](ruststack_xml_binding::TypeRegistry)
//! - [`S3SoapOperation`] enumerates the sixteen operations
//! - [`S3SoapHandler`] is the seam for business logic; [`S3SoapService`] drives it
//! - [`SoapFault`] and [`fault_to_xml`] report failures
//! - [`beans`] offers typed structs for the common records
//!
//! # S3 SOAP conventions
//!
//! - Namespace: `http://s3.amazonaws.com/doc/2006-03-01/`
//! - The grantee hierarchy is abstract and always carries `xsi:type`
//! - Timestamps: ISO 8601 format (`2006-02-03T16:45:09.000Z`)
//! - Object data travels inline as base64 or as an MTOM attachment

pub mod beans;
pub mod fault;
pub mod handler;
pub mod operations;
pub mod registry;
pub mod service;
pub mod types;

/// The S3 2006-03-01 namespace.
pub const S3_NAMESPACE: &str = "http://s3.amazonaws.com/doc/2006-03-01/";

pub use fault::{FaultCode, SOAP_ENVELOPE_NAMESPACE, SoapFault, fault_to_xml};
pub use handler::{NotImplementedHandler, S3SoapHandler};
pub use operations::{S3SoapOperation, register_operations};
pub use registry::build_registry;
pub use service::{S3SoapService, SoapResponse};
pub use types::register_types;
