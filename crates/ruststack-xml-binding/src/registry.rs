//! Type registry: resolves qualified type names to record schemas.
//!
//! The registry is the polymorphic dispatch table of the codec. When a payload
//! announces `xsi:type="ns:Subtype"`, the parser looks the name up here and
//! continues with the subtype's schema. A miss is a hard [`UnknownType`] error.
//!
//! A [`TypeRegistry`] is built once at startup and then shared read-only, so
//! concurrent parses need no locking. [`SharedTypeRegistry`] wraps one behind a
//! read/write lock for the rare case where types are added after startup.
//!
//! [`UnknownType`]: crate::XmlBindError::UnknownType

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use tracing::debug;

use crate::error::XmlBindError;
use crate::record::Record;
use crate::schema::{FieldType, QName, RecordSchema};

/// Maps type names to their schemas.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<QName, Arc<RecordSchema>>,
}

impl TypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under its own type name.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateType` if the name is taken and `InvalidSchema` if the
    /// schema breaks a structural rule.
    pub fn register(&mut self, schema: RecordSchema) -> Result<Arc<RecordSchema>, XmlBindError> {
        let schema = Arc::new(schema);
        self.register_shared(Arc::clone(&schema))?;
        Ok(schema)
    }

    /// Register an already shared schema.
    ///
    /// # Errors
    ///
    /// Same as [`TypeRegistry::register`].
    pub fn register_shared(&mut self, schema: Arc<RecordSchema>) -> Result<(), XmlBindError> {
        let name = schema.type_name().clone();
        if self.types.contains_key(&name) {
            return Err(XmlBindError::DuplicateType(name));
        }
        schema
            .validate()
            .map_err(|reason| XmlBindError::InvalidSchema {
                record: name.clone(),
                reason,
            })?;
        debug!(
            type_name = %name,
            fields = schema.fields().len(),
            "registered record type"
        );
        self.types.insert(name, schema);
        Ok(())
    }

    /// Look up a schema by type name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if nothing is registered under `name`.
    pub fn resolve(&self, name: &QName) -> Result<&Arc<RecordSchema>, XmlBindError> {
        self.types
            .get(name)
            .ok_or_else(|| XmlBindError::UnknownType(name.clone()))
    }

    /// Look up a schema by namespace and local name.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if nothing is registered under the name.
    pub fn resolve_name(
        &self,
        namespace: &str,
        local_name: &str,
    ) -> Result<&Arc<RecordSchema>, XmlBindError> {
        self.resolve(&QName::new(namespace.to_owned(), local_name.to_owned()))
    }

    /// Create an empty record of a registered type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if nothing is registered under `name`.
    pub fn new_record(&self, name: &QName) -> Result<Record, XmlBindError> {
        self.resolve(name).map(|schema| Record::new(Arc::clone(schema)))
    }

    /// Whether a type is registered.
    #[must_use]
    pub fn contains(&self, name: &QName) -> bool {
        self.types.contains_key(name)
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered schemas in no particular order.
    pub fn schemas(&self) -> impl Iterator<Item = &Arc<RecordSchema>> {
        self.types.values()
    }

    /// Check that every base type and nested record type is registered.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for the first referenced type that is missing.
    pub fn validate_closure(&self) -> Result<(), XmlBindError> {
        for schema in self.types.values() {
            for ancestor in schema.ancestors() {
                self.resolve(ancestor)?;
            }
            for field in schema.fields() {
                if let FieldType::Record(nested) = field.field_type() {
                    self.resolve(nested)?;
                }
            }
        }
        Ok(())
    }
}

/// A [`TypeRegistry`] that can be extended while shared.
///
/// Reads take a shared lock; registration takes the write lock, so extensions
/// are serialized against each other and against in-flight lookups.
#[derive(Debug, Clone, Default)]
pub struct SharedTypeRegistry {
    inner: Arc<RwLock<TypeRegistry>>,
}

impl SharedTypeRegistry {
    /// Wrap a registry built at startup.
    #[must_use]
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Borrow the registry for one or more parse/serialize calls.
    pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.inner.read()
    }

    /// Register an additional type.
    ///
    /// # Errors
    ///
    /// Same as [`TypeRegistry::register`].
    pub fn register(&self, schema: RecordSchema) -> Result<Arc<RecordSchema>, XmlBindError> {
        self.inner.write().register(schema)
    }
}
