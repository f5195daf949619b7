//! Integration tests for the S3 SOAP codec.
//!
//! These tests drive the S3 2006-03-01 schemas from `ruststack-s3-soap-model`
//! through the generic codec in `ruststack-xml-binding`, the way a SOAP
//! transport would.
//!
//! Run them with:
//! ```text
//! cargo test -p ruststack-integration
//! ```

use std::sync::Once;

use ruststack_s3_soap_model::{S3_NAMESPACE, build_registry};
use ruststack_xml_binding::{CodecConfig, QName, Record, TypeRegistry, from_xml, to_xml};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// A registry holding every S3 SOAP type and message.
///
/// # Panics
///
/// Panics if the built-in schemas are inconsistent.
#[must_use]
pub fn s3_registry() -> TypeRegistry {
    init_tracing();
    build_registry().expect("S3 SOAP registry should build")
}

/// Expand `{ns}` in a hand-written payload to the S3 namespace.
#[must_use]
pub fn s3_payload(template: &str) -> Vec<u8> {
    template.replace("{ns}", S3_NAMESPACE).into_bytes()
}

/// Serialize `record` as `element` and parse it back with the same static type.
///
/// # Panics
///
/// Panics if either direction fails.
#[must_use]
pub fn round_trip(
    record: &Record,
    element: &QName,
    registry: &TypeRegistry,
    config: &CodecConfig,
) -> (String, Record) {
    let xml = to_xml(record, element, element, config).expect("serialize");
    let parsed = from_xml(&xml, element, element, registry, config).expect("parse");
    (String::from_utf8(xml).expect("valid UTF-8"), parsed)
}

/// Count non-overlapping occurrences of `needle`.
#[must_use]
pub fn occurrences(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

mod test_arrays;
mod test_polymorphism;
mod test_presence;
mod test_service;
