//! Shared complex types of the S3 2006-03-01 SOAP schema.
//!
//! Every type is registered under its qualified name in the S3 namespace. The
//! grantee hierarchy is abstract at its top two levels, so a `Grantee` element
//! must always carry `xsi:type` naming one of `CanonicalUser`,
//! `AmazonCustomerByEmail` or `Group`.

use ruststack_xml_binding::{
    FieldDescriptor, FieldType, QName, RecordSchema, TypeRegistry, XmlBindError,
};

use crate::S3_NAMESPACE;

/// Qualified name in the S3 namespace.
#[must_use]
pub const fn s3(local_name: &'static str) -> QName {
    QName::from_static(S3_NAMESPACE, local_name)
}

/// Abstract root of the grantee hierarchy.
pub const GRANTEE: QName = s3("Grantee");
/// Abstract user grantee.
pub const USER: QName = s3("User");
/// User identified by e-mail address.
pub const AMAZON_CUSTOMER_BY_EMAIL: QName = s3("AmazonCustomerByEmail");
/// User identified by canonical id.
pub const CANONICAL_USER: QName = s3("CanonicalUser");
/// Predefined group of users.
pub const GROUP: QName = s3("Group");
/// One grantee/permission pair.
pub const GRANT: QName = s3("Grant");
/// List of grants.
pub const ACCESS_CONTROL_LIST: QName = s3("AccessControlList");
/// Owner plus access control list.
pub const ACCESS_CONTROL_POLICY: QName = s3("AccessControlPolicy");
/// User metadata name/value pair.
pub const METADATA_ENTRY: QName = s3("MetadataEntry");
/// Operation status code and description.
pub const STATUS: QName = s3("Status");
/// Base of result types carrying a status.
pub const RESULT: QName = s3("Result");
/// Result of `GetObject` and `GetObjectExtended`.
pub const GET_OBJECT_RESULT: QName = s3("GetObjectResult");
/// Result of `PutObject` and `PutObjectInline`.
pub const PUT_OBJECT_RESULT: QName = s3("PutObjectResult");
/// One key in a bucket listing.
pub const LIST_ENTRY: QName = s3("ListEntry");
/// One common prefix in a bucket listing.
pub const PREFIX_ENTRY: QName = s3("PrefixEntry");
/// Result of `ListBucket`.
pub const LIST_BUCKET_RESULT: QName = s3("ListBucketResult");
/// One bucket in an account listing.
pub const LIST_ALL_MY_BUCKETS_ENTRY: QName = s3("ListAllMyBucketsEntry");
/// Buckets of an account listing.
pub const LIST_ALL_MY_BUCKETS_LIST: QName = s3("ListAllMyBucketsList");
/// Result of `ListAllMyBuckets`.
pub const LIST_ALL_MY_BUCKETS_RESULT: QName = s3("ListAllMyBucketsResult");
/// Result of `CopyObject`.
pub const COPY_OBJECT_RESULT: QName = s3("CopyObjectResult");
/// Result of `CreateBucket`.
pub const CREATE_BUCKET_RESULT: QName = s3("CreateBucketResult");
/// Server access logging state of a bucket.
pub const BUCKET_LOGGING_STATUS: QName = s3("BucketLoggingStatus");
/// Where access logs are delivered.
pub const LOGGING_SETTINGS: QName = s3("LoggingSettings");

/// `Permission` values.
pub const PERMISSIONS: &[&str] = &["READ", "WRITE", "READ_ACP", "WRITE_ACP", "FULL_CONTROL"];
/// `StorageClass` values.
pub const STORAGE_CLASSES: &[&str] = &["STANDARD", "REDUCED_REDUNDANCY", "GLACIER", "UNKNOWN"];
/// `MetadataDirective` values.
pub const METADATA_DIRECTIVES: &[&str] = &["COPY", "REPLACE"];

pub(crate) fn required(local_name: &'static str, field_type: FieldType) -> FieldDescriptor {
    FieldDescriptor::required(s3(local_name), field_type)
}

pub(crate) fn optional(local_name: &'static str, field_type: FieldType) -> FieldDescriptor {
    FieldDescriptor::optional(s3(local_name), field_type)
}

pub(crate) fn record(type_name: QName) -> FieldType {
    FieldType::Record(type_name)
}

/// Register the shared types.
///
/// # Errors
///
/// Returns an error if a type is already registered or fails validation.
pub fn register_types(registry: &mut TypeRegistry) -> Result<(), XmlBindError> {
    let grantee = registry.register(RecordSchema::builder(GRANTEE).abstract_type().build())?;
    let user = registry.register(
        RecordSchema::extending(USER, &grantee)
            .abstract_type()
            .build(),
    )?;
    registry.register(
        RecordSchema::extending(AMAZON_CUSTOMER_BY_EMAIL, &user)
            .field(required("EmailAddress", FieldType::String))
            .build(),
    )?;
    registry.register(
        RecordSchema::extending(CANONICAL_USER, &user)
            .field(required("ID", FieldType::String))
            .field(optional("DisplayName", FieldType::String))
            .build(),
    )?;
    registry.register(
        RecordSchema::extending(GROUP, &grantee)
            .field(required("URI", FieldType::String))
            .build(),
    )?;

    registry.register(
        RecordSchema::builder(GRANT)
            .field(required("Grantee", record(GRANTEE)))
            .field(required("Permission", FieldType::Enumeration(PERMISSIONS)))
            .build(),
    )?;
    registry.register(
        RecordSchema::builder(ACCESS_CONTROL_LIST)
            .field(optional("Grant", record(GRANT)).repeated())
            .build(),
    )?;
    registry.register(
        RecordSchema::builder(ACCESS_CONTROL_POLICY)
            .field(required("Owner", record(CANONICAL_USER)))
            .field(required("AccessControlList", record(ACCESS_CONTROL_LIST)))
            .build(),
    )?;

    registry.register(
        RecordSchema::builder(METADATA_ENTRY)
            .field(required("Name", FieldType::String))
            .field(required("Value", FieldType::String))
            .build(),
    )?;
    registry.register(
        RecordSchema::builder(STATUS)
            .field(required("Code", FieldType::Int))
            .field(required("Description", FieldType::String))
            .build(),
    )?;
    let result = registry.register(
        RecordSchema::builder(RESULT)
            .field(required("Status", record(STATUS)))
            .build(),
    )?;
    registry.register(
        RecordSchema::extending(GET_OBJECT_RESULT, &result)
            .field(optional("Metadata", record(METADATA_ENTRY)).repeated())
            .field(optional("Data", FieldType::Binary).nillable())
            .field(required("LastModified", FieldType::Timestamp))
            .field(required("ETag", FieldType::String))
            .build(),
    )?;
    registry.register(
        RecordSchema::builder(PUT_OBJECT_RESULT)
            .field(required("ETag", FieldType::String))
            .field(required("LastModified", FieldType::Timestamp))
            .build(),
    )?;

    registry.register(
        RecordSchema::builder(LIST_ENTRY)
            .field(required("Key", FieldType::String))
            .field(required("LastModified", FieldType::Timestamp))
            .field(required("ETag", FieldType::String))
            .field(required("Size", FieldType::Long))
            .field(optional("Owner", record(CANONICAL_USER)))
            .field(required("StorageClass", FieldType::Enumeration(STORAGE_CLASSES)))
            .build(),
    )?;
    registry.register(
        RecordSchema::builder(PREFIX_ENTRY)
            .field(required("Prefix", FieldType::String))
            .build(),
    )?;
    registry.register(
        RecordSchema::builder(LIST_BUCKET_RESULT)
            .field(optional("Metadata", record(METADATA_ENTRY)).repeated())
            .field(required("Name", FieldType::String))
            .field(required("Prefix", FieldType::String))
            .field(required("Marker", FieldType::String))
            .field(optional("NextMarker", FieldType::String))
            .field(required("MaxKeys", FieldType::Int))
            .field(optional("Delimiter", FieldType::String))
            .field(required("IsTruncated", FieldType::Boolean))
            .field(optional("Contents", record(LIST_ENTRY)).repeated())
            .field(optional("CommonPrefixes", record(PREFIX_ENTRY)).repeated())
            .build(),
    )?;

    registry.register(
        RecordSchema::builder(LIST_ALL_MY_BUCKETS_ENTRY)
            .field(required("Name", FieldType::String))
            .field(required("CreationDate", FieldType::Timestamp))
            .build(),
    )?;
    registry.register(
        RecordSchema::builder(LIST_ALL_MY_BUCKETS_LIST)
            .field(optional("Bucket", record(LIST_ALL_MY_BUCKETS_ENTRY)).repeated())
            .build(),
    )?;
    registry.register(
        RecordSchema::builder(LIST_ALL_MY_BUCKETS_RESULT)
            .field(required("Owner", record(CANONICAL_USER)))
            .field(required("Buckets", record(LIST_ALL_MY_BUCKETS_LIST)))
            .build(),
    )?;

    registry.register(
        RecordSchema::builder(COPY_OBJECT_RESULT)
            .field(required("LastModified", FieldType::Timestamp))
            .field(required("ETag", FieldType::String))
            .build(),
    )?;
    registry.register(
        RecordSchema::builder(CREATE_BUCKET_RESULT)
            .field(required("BucketName", FieldType::String))
            .build(),
    )?;

    registry.register(
        RecordSchema::builder(LOGGING_SETTINGS)
            .field(required("TargetBucket", FieldType::String))
            .field(required("TargetPrefix", FieldType::String))
            .field(optional("TargetGrants", record(ACCESS_CONTROL_LIST)))
            .build(),
    )?;
    registry.register(
        RecordSchema::builder(BUCKET_LOGGING_STATUS)
            .field(optional("LoggingEnabled", record(LOGGING_SETTINGS)))
            .build(),
    )?;

    Ok(())
}
