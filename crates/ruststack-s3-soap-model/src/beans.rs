//! Typed views over common S3 SOAP records.
//!
//! Handlers may work with generic [`Record`]s directly; these structs cover the
//! types most handlers touch and convert through [`XmlRecord`].

use chrono::{DateTime, Utc};
use ruststack_xml_binding::{QName, Record, TypeRegistry, Value, XmlBindError, XmlRecord};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::operations::S3SoapOperation;
use crate::types::{
    ACCESS_CONTROL_LIST, AMAZON_CUSTOMER_BY_EMAIL, CANONICAL_USER, CREATE_BUCKET_RESULT, GRANT,
    GRANTEE, GROUP, METADATA_ENTRY,
};

// ---------------------------------------------------------------------------
// Field access helpers
// ---------------------------------------------------------------------------

fn field_name(record: &Record, local_name: &str) -> QName {
    record
        .schema()
        .field(local_name)
        .map_or_else(
            || QName::new(record.type_name().namespace().to_owned(), local_name.to_owned()),
            |f| f.name().clone(),
        )
}

fn wrong_kind(record: &Record, local_name: &str, expected: &str, found: &Value) -> XmlBindError {
    XmlBindError::InvalidValue {
        field: field_name(record, local_name),
        reason: format!("expected {expected}, got {}", found.kind_label()),
    }
}

fn require<T>(record: &Record, local_name: &str, value: Option<T>) -> Result<T, XmlBindError> {
    value.ok_or_else(|| XmlBindError::MissingRequiredField {
        record: record.type_name().clone(),
        field: field_name(record, local_name),
    })
}

fn optional_string(record: &Record, local_name: &str) -> Result<Option<String>, XmlBindError> {
    match record.get(local_name)? {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_kind(record, local_name, "string", other)),
    }
}

fn required_string(record: &Record, local_name: &str) -> Result<String, XmlBindError> {
    let value = optional_string(record, local_name)?;
    require(record, local_name, value)
}

fn optional_timestamp(
    record: &Record,
    local_name: &str,
) -> Result<Option<DateTime<Utc>>, XmlBindError> {
    match record.get(local_name)? {
        None => Ok(None),
        Some(Value::Timestamp(t)) => Ok(Some(*t)),
        Some(other) => Err(wrong_kind(record, local_name, "dateTime", other)),
    }
}

fn optional_record<'r>(record: &'r Record, local_name: &str) -> Result<Option<&'r Record>, XmlBindError> {
    match record.get(local_name)? {
        None => Ok(None),
        Some(Value::Record(r)) => Ok(Some(r)),
        Some(other) => Err(wrong_kind(record, local_name, "record", other)),
    }
}

fn records<'r>(record: &'r Record, local_name: &str) -> Result<Vec<&'r Record>, XmlBindError> {
    match record.get(local_name)? {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_record()
                    .ok_or_else(|| wrong_kind(record, local_name, "record", item))
            })
            .collect(),
        Some(other) => Err(wrong_kind(record, local_name, "array", other)),
    }
}

// ---------------------------------------------------------------------------
// MetadataEntry
// ---------------------------------------------------------------------------

/// User metadata attached to an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Metadata name.
    pub name: String,
    /// Metadata value.
    pub value: String,
}

impl XmlRecord for MetadataEntry {
    fn schema_type() -> QName {
        METADATA_ENTRY
    }

    fn to_record(&self, registry: &TypeRegistry) -> Result<Record, XmlBindError> {
        registry
            .new_record(&Self::schema_type())?
            .with("Name", self.name.as_str())?
            .with("Value", self.value.as_str())
    }

    fn from_record(record: &Record) -> Result<Self, XmlBindError> {
        Ok(Self {
            name: required_string(record, "Name")?,
            value: required_string(record, "Value")?,
        })
    }
}

// ---------------------------------------------------------------------------
// Grantee / Grant
// ---------------------------------------------------------------------------

/// The concrete grantee kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Grantee {
    /// An account identified by canonical id.
    CanonicalUser {
        /// Canonical user id.
        id: String,
        /// Display name.
        display_name: Option<String>,
    },
    /// An account identified by e-mail address.
    AmazonCustomerByEmail {
        /// E-mail address.
        email_address: String,
    },
    /// A predefined group such as `AllUsers`.
    Group {
        /// Group URI.
        uri: String,
    },
}

impl XmlRecord for Grantee {
    fn schema_type() -> QName {
        GRANTEE
    }

    fn to_record(&self, registry: &TypeRegistry) -> Result<Record, XmlBindError> {
        match self {
            Self::CanonicalUser { id, display_name } => {
                let mut record = registry.new_record(&CANONICAL_USER)?.with("ID", id.as_str())?;
                record.set_optional("DisplayName", display_name.as_deref())?;
                Ok(record)
            }
            Self::AmazonCustomerByEmail { email_address } => registry
                .new_record(&AMAZON_CUSTOMER_BY_EMAIL)?
                .with("EmailAddress", email_address.as_str()),
            Self::Group { uri } => registry.new_record(&GROUP)?.with("URI", uri.as_str()),
        }
    }

    fn from_record(record: &Record) -> Result<Self, XmlBindError> {
        let type_name = record.type_name();
        if *type_name == CANONICAL_USER {
            Ok(Self::CanonicalUser {
                id: required_string(record, "ID")?,
                display_name: optional_string(record, "DisplayName")?,
            })
        } else if *type_name == AMAZON_CUSTOMER_BY_EMAIL {
            Ok(Self::AmazonCustomerByEmail {
                email_address: required_string(record, "EmailAddress")?,
            })
        } else if *type_name == GROUP {
            Ok(Self::Group {
                uri: required_string(record, "URI")?,
            })
        } else {
            Err(XmlBindError::InvalidSubstitution {
                expected: GRANTEE,
                actual: type_name.clone(),
            })
        }
    }
}

/// Access granted to a grantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// READ.
    Read,
    /// WRITE.
    Write,
    /// READ_ACP.
    ReadAcp,
    /// WRITE_ACP.
    WriteAcp,
    /// FULL_CONTROL.
    FullControl,
}

impl Permission {
    /// Returns the wire value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::ReadAcp => "READ_ACP",
            Self::WriteAcp => "WRITE_ACP",
            Self::FullControl => "FULL_CONTROL",
        }
    }

    /// Parse a wire value.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "READ" => Some(Self::Read),
            "WRITE" => Some(Self::Write),
            "READ_ACP" => Some(Self::ReadAcp),
            "WRITE_ACP" => Some(Self::WriteAcp),
            "FULL_CONTROL" => Some(Self::FullControl),
            _ => None,
        }
    }
}

/// One entry of an access control list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Who receives the permission.
    pub grantee: Grantee,
    /// What is granted.
    pub permission: Permission,
}

impl XmlRecord for Grant {
    fn schema_type() -> QName {
        GRANT
    }

    fn to_record(&self, registry: &TypeRegistry) -> Result<Record, XmlBindError> {
        registry
            .new_record(&Self::schema_type())?
            .with("Grantee", self.grantee.to_record(registry)?)?
            .with("Permission", self.permission.as_str())
    }

    fn from_record(record: &Record) -> Result<Self, XmlBindError> {
        let grantee = optional_record(record, "Grantee")?;
        let grantee = Grantee::from_record(require(record, "Grantee", grantee)?)?;
        let permission = required_string(record, "Permission")?;
        let permission =
            Permission::from_wire(&permission).ok_or_else(|| XmlBindError::InvalidValue {
                field: field_name(record, "Permission"),
                reason: format!("unknown permission {permission:?}"),
            })?;
        Ok(Self {
            grantee,
            permission,
        })
    }
}

fn grants_to_record(grants: &[Grant], registry: &TypeRegistry) -> Result<Record, XmlBindError> {
    let items = grants
        .iter()
        .map(|grant| grant.to_record(registry).map(Value::from))
        .collect::<Result<Vec<_>, _>>()?;
    registry
        .new_record(&ACCESS_CONTROL_LIST)?
        .with("Grant", Value::Array(items))
}

fn grants_from_record(record: &Record) -> Result<Vec<Grant>, XmlBindError> {
    records(record, "Grant")?
        .into_iter()
        .map(Grant::from_record)
        .collect()
}

// ---------------------------------------------------------------------------
// CreateBucket
// ---------------------------------------------------------------------------

/// The `CreateBucket` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
pub struct CreateBucket {
    /// Name of the bucket to create.
    #[builder(setter(into))]
    pub bucket: String,
    /// Initial access control list.
    #[builder(default, setter(strip_option))]
    pub access_control_list: Option<Vec<Grant>>,
    /// Access key of the signer.
    #[builder(default, setter(strip_option, into))]
    pub aws_access_key_id: Option<String>,
    /// Signing time.
    #[builder(default, setter(strip_option))]
    pub timestamp: Option<DateTime<Utc>>,
    /// Request signature.
    #[builder(default, setter(strip_option, into))]
    pub signature: Option<String>,
}

impl XmlRecord for CreateBucket {
    fn schema_type() -> QName {
        S3SoapOperation::CreateBucket.request_element()
    }

    fn to_record(&self, registry: &TypeRegistry) -> Result<Record, XmlBindError> {
        let mut record = registry
            .new_record(&Self::schema_type())?
            .with("Bucket", self.bucket.as_str())?;
        if let Some(grants) = &self.access_control_list {
            record.set("AccessControlList", grants_to_record(grants, registry)?)?;
        }
        record.set_optional("AWSAccessKeyId", self.aws_access_key_id.as_deref())?;
        record.set_optional("Timestamp", self.timestamp)?;
        record.set_optional("Signature", self.signature.as_deref())?;
        Ok(record)
    }

    fn from_record(record: &Record) -> Result<Self, XmlBindError> {
        let access_control_list = optional_record(record, "AccessControlList")?
            .map(grants_from_record)
            .transpose()?;
        Ok(Self {
            bucket: required_string(record, "Bucket")?,
            access_control_list,
            aws_access_key_id: optional_string(record, "AWSAccessKeyId")?,
            timestamp: optional_timestamp(record, "Timestamp")?,
            signature: optional_string(record, "Signature")?,
        })
    }
}

/// The `CreateBucket` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBucketResult {
    /// Name of the created bucket.
    pub bucket_name: String,
}

impl CreateBucketResult {
    /// Wrap the result in a `CreateBucketResponse` record.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if the S3 schemas are not registered.
    pub fn into_response(&self, registry: &TypeRegistry) -> Result<Record, XmlBindError> {
        registry
            .new_record(&S3SoapOperation::CreateBucket.response_element())?
            .with("CreateBucketReturn", self.to_record(registry)?)
    }
}

impl XmlRecord for CreateBucketResult {
    fn schema_type() -> QName {
        CREATE_BUCKET_RESULT
    }

    fn to_record(&self, registry: &TypeRegistry) -> Result<Record, XmlBindError> {
        registry
            .new_record(&Self::schema_type())?
            .with("BucketName", self.bucket_name.as_str())
    }

    fn from_record(record: &Record) -> Result<Self, XmlBindError> {
        Ok(Self {
            bucket_name: required_string(record, "BucketName")?,
        })
    }
}
