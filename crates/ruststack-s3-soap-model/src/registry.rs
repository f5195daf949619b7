//! Registry population for the S3 SOAP schema.

use ruststack_xml_binding::{TypeRegistry, XmlBindError};
use tracing::debug;

use crate::operations::register_operations;
use crate::types::register_types;

/// Build a registry holding every S3 SOAP type and message.
///
/// # Errors
///
/// Returns an error if the built-in schemas are inconsistent.
pub fn build_registry() -> Result<TypeRegistry, XmlBindError> {
    let mut registry = TypeRegistry::new();
    register_types(&mut registry)?;
    register_operations(&mut registry)?;
    registry.validate_closure()?;
    debug!(types = registry.len(), "built S3 SOAP type registry");
    Ok(registry)
}
