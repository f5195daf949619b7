//! Operations of the S3 2006-03-01 SOAP interface and their message schemas.
//!
//! Each operation has a request element and a response element. Both are
//! anonymous complex types in the WSDL; here they are registered under the
//! element name so the element and its static type share one [`QName`].

use std::fmt;

use ruststack_xml_binding::{FieldDescriptor, FieldType, QName, RecordSchema, TypeRegistry, XmlBindError};

use crate::S3_NAMESPACE;
use crate::types::{
    ACCESS_CONTROL_LIST, ACCESS_CONTROL_POLICY, BUCKET_LOGGING_STATUS, COPY_OBJECT_RESULT,
    CREATE_BUCKET_RESULT, GET_OBJECT_RESULT, LIST_ALL_MY_BUCKETS_RESULT, LIST_BUCKET_RESULT,
    METADATA_DIRECTIVES, METADATA_ENTRY, PUT_OBJECT_RESULT, STATUS, STORAGE_CLASSES, optional,
    record, required,
};

const IF_MODIFIED: u32 = 1;
const IF_MATCH: u32 = 2;

/// All operations of the S3 SOAP interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S3SoapOperation {
    /// The CreateBucket operation.
    CreateBucket,
    /// The DeleteBucket operation.
    DeleteBucket,
    /// The GetObjectAccessControlPolicy operation.
    GetObjectAccessControlPolicy,
    /// The GetBucketAccessControlPolicy operation.
    GetBucketAccessControlPolicy,
    /// The SetObjectAccessControlPolicy operation.
    SetObjectAccessControlPolicy,
    /// The SetBucketAccessControlPolicy operation.
    SetBucketAccessControlPolicy,
    /// The GetObject operation.
    GetObject,
    /// The GetObjectExtended operation.
    GetObjectExtended,
    /// The PutObject operation.
    PutObject,
    /// The PutObjectInline operation.
    PutObjectInline,
    /// The DeleteObject operation.
    DeleteObject,
    /// The ListBucket operation.
    ListBucket,
    /// The ListAllMyBuckets operation.
    ListAllMyBuckets,
    /// The SetBucketLoggingStatus operation.
    SetBucketLoggingStatus,
    /// The GetBucketLoggingStatus operation.
    GetBucketLoggingStatus,
    /// The CopyObject operation.
    CopyObject,
}

impl S3SoapOperation {
    /// Every operation, in WSDL order.
    pub const ALL: [Self; 16] = [
        Self::CreateBucket,
        Self::DeleteBucket,
        Self::GetObjectAccessControlPolicy,
        Self::GetBucketAccessControlPolicy,
        Self::SetObjectAccessControlPolicy,
        Self::SetBucketAccessControlPolicy,
        Self::GetObject,
        Self::GetObjectExtended,
        Self::PutObject,
        Self::PutObjectInline,
        Self::DeleteObject,
        Self::ListBucket,
        Self::ListAllMyBuckets,
        Self::SetBucketLoggingStatus,
        Self::GetBucketLoggingStatus,
        Self::CopyObject,
    ];

    /// Returns the operation name, which is also the request element's local name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateBucket => "CreateBucket",
            Self::DeleteBucket => "DeleteBucket",
            Self::GetObjectAccessControlPolicy => "GetObjectAccessControlPolicy",
            Self::GetBucketAccessControlPolicy => "GetBucketAccessControlPolicy",
            Self::SetObjectAccessControlPolicy => "SetObjectAccessControlPolicy",
            Self::SetBucketAccessControlPolicy => "SetBucketAccessControlPolicy",
            Self::GetObject => "GetObject",
            Self::GetObjectExtended => "GetObjectExtended",
            Self::PutObject => "PutObject",
            Self::PutObjectInline => "PutObjectInline",
            Self::DeleteObject => "DeleteObject",
            Self::ListBucket => "ListBucket",
            Self::ListAllMyBuckets => "ListAllMyBuckets",
            Self::SetBucketLoggingStatus => "SetBucketLoggingStatus",
            Self::GetBucketLoggingStatus => "GetBucketLoggingStatus",
            Self::CopyObject => "CopyObject",
        }
    }

    /// Parse an operation from its name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// Find the operation whose request element is `element`.
    #[must_use]
    pub fn from_request_element(element: &QName) -> Option<Self> {
        if element.namespace() != S3_NAMESPACE {
            return None;
        }
        Self::from_name(element.local_name())
    }

    /// Local name of the response element.
    #[must_use]
    pub fn response_name(&self) -> &'static str {
        match self {
            Self::CreateBucket => "CreateBucketResponse",
            Self::DeleteBucket => "DeleteBucketResponse",
            Self::GetObjectAccessControlPolicy => "GetObjectAccessControlPolicyResponse",
            Self::GetBucketAccessControlPolicy => "GetBucketAccessControlPolicyResponse",
            Self::SetObjectAccessControlPolicy => "SetObjectAccessControlPolicyResponse",
            Self::SetBucketAccessControlPolicy => "SetBucketAccessControlPolicyResponse",
            Self::GetObject => "GetObjectResponse",
            Self::GetObjectExtended => "GetObjectExtendedResponse",
            Self::PutObject => "PutObjectResponse",
            Self::PutObjectInline => "PutObjectInlineResponse",
            Self::DeleteObject => "DeleteObjectResponse",
            Self::ListBucket => "ListBucketResponse",
            Self::ListAllMyBuckets => "ListAllMyBucketsResponse",
            Self::SetBucketLoggingStatus => "SetBucketLoggingStatusResponse",
            Self::GetBucketLoggingStatus => "GetBucketLoggingStatusResponse",
            Self::CopyObject => "CopyObjectResponse",
        }
    }

    /// Request element name, also the request's static type.
    #[must_use]
    pub fn request_element(&self) -> QName {
        QName::from_static(S3_NAMESPACE, self.as_str())
    }

    /// Response element name, also the response's static type.
    #[must_use]
    pub fn response_element(&self) -> QName {
        QName::from_static(S3_NAMESPACE, self.response_name())
    }

    /// The single child of the response element and its type, if the response has one.
    #[must_use]
    pub fn response_return(&self) -> Option<(&'static str, QName)> {
        match self {
            Self::CreateBucket => Some(("CreateBucketReturn", CREATE_BUCKET_RESULT)),
            Self::DeleteBucket => Some(("DeleteBucketResponse", STATUS)),
            Self::GetObjectAccessControlPolicy => Some((
                "GetObjectAccessControlPolicyResponse",
                ACCESS_CONTROL_POLICY,
            )),
            Self::GetBucketAccessControlPolicy => Some((
                "GetBucketAccessControlPolicyResponse",
                ACCESS_CONTROL_POLICY,
            )),
            Self::GetObject | Self::GetObjectExtended => {
                Some(("GetObjectResponse", GET_OBJECT_RESULT))
            }
            Self::PutObject => Some(("PutObjectResponse", PUT_OBJECT_RESULT)),
            Self::PutObjectInline => Some(("PutObjectInlineResponse", PUT_OBJECT_RESULT)),
            Self::DeleteObject => Some(("DeleteObjectResponse", STATUS)),
            Self::ListBucket => Some(("ListBucketResponse", LIST_BUCKET_RESULT)),
            Self::ListAllMyBuckets => {
                Some(("ListAllMyBucketsResponse", LIST_ALL_MY_BUCKETS_RESULT))
            }
            Self::GetBucketLoggingStatus => {
                Some(("GetBucketLoggingStatusResponse", BUCKET_LOGGING_STATUS))
            }
            Self::CopyObject => Some(("CopyObjectResult", COPY_OBJECT_RESULT)),
            Self::SetObjectAccessControlPolicy
            | Self::SetBucketAccessControlPolicy
            | Self::SetBucketLoggingStatus => None,
        }
    }

    /// Schema of the request element.
    #[must_use]
    pub fn request_schema(&self) -> RecordSchema {
        let builder = RecordSchema::builder(self.request_element());
        let builder = match self {
            Self::CreateBucket => builder
                .field(required("Bucket", FieldType::String))
                .field(optional("AccessControlList", record(ACCESS_CONTROL_LIST)))
                .fields(authentication(false)),
            Self::DeleteBucket
            | Self::GetBucketAccessControlPolicy
            | Self::GetBucketLoggingStatus => builder
                .field(required("Bucket", FieldType::String))
                .fields(authentication(true)),
            Self::GetObjectAccessControlPolicy | Self::DeleteObject => builder
                .field(required("Bucket", FieldType::String))
                .field(required("Key", FieldType::String))
                .fields(authentication(true)),
            Self::SetObjectAccessControlPolicy => builder
                .field(required("Bucket", FieldType::String))
                .field(required("Key", FieldType::String))
                .field(required("AccessControlList", record(ACCESS_CONTROL_LIST)))
                .fields(authentication(true)),
            Self::SetBucketAccessControlPolicy => builder
                .field(required("Bucket", FieldType::String))
                .field(optional("AccessControlList", record(ACCESS_CONTROL_LIST)))
                .fields(authentication(true)),
            Self::GetObject => builder
                .fields(object_retrieval())
                .fields(authentication(true)),
            Self::GetObjectExtended => builder
                .fields(object_retrieval())
                .field(optional("ByteRangeStart", FieldType::Long))
                .field(optional("ByteRangeEnd", FieldType::Long))
                .field(optional("IfModifiedSince", FieldType::Timestamp).in_choice(IF_MODIFIED))
                .field(optional("IfUnmodifiedSince", FieldType::Timestamp).in_choice(IF_MODIFIED))
                .field(
                    optional("IfMatch", FieldType::String)
                        .repeated()
                        .in_choice(IF_MATCH),
                )
                .field(
                    optional("IfNoneMatch", FieldType::String)
                        .repeated()
                        .in_choice(IF_MATCH),
                )
                .field(optional("ReturnCompleteObjectOnConditionFailure", FieldType::Boolean))
                .fields(authentication(true)),
            Self::PutObject => builder
                .field(required("Bucket", FieldType::String))
                .field(required("Key", FieldType::String))
                .field(optional("Metadata", record(METADATA_ENTRY)).repeated())
                .field(required("ContentLength", FieldType::Long))
                .field(optional("AccessControlList", record(ACCESS_CONTROL_LIST)))
                .field(optional("StorageClass", FieldType::Enumeration(STORAGE_CLASSES)))
                .fields(authentication(true)),
            Self::PutObjectInline => builder
                .field(required("Bucket", FieldType::String))
                .field(required("Key", FieldType::String))
                .field(optional("Metadata", record(METADATA_ENTRY)).repeated())
                .field(required("Data", FieldType::Binary))
                .field(required("ContentLength", FieldType::Long))
                .field(optional("AccessControlList", record(ACCESS_CONTROL_LIST)))
                .field(optional("StorageClass", FieldType::Enumeration(STORAGE_CLASSES)))
                .fields(authentication(true)),
            Self::ListBucket => builder
                .field(required("Bucket", FieldType::String))
                .field(optional("Prefix", FieldType::String))
                .field(optional("Marker", FieldType::String))
                .field(optional("MaxKeys", FieldType::Int))
                .field(optional("Delimiter", FieldType::String))
                .fields(authentication(true)),
            Self::ListAllMyBuckets => builder.fields(authentication(false)),
            Self::SetBucketLoggingStatus => builder
                .field(required("Bucket", FieldType::String))
                .fields(authentication(true))
                .field(required("BucketLoggingStatus", record(BUCKET_LOGGING_STATUS))),
            Self::CopyObject => builder
                .field(required("SourceBucket", FieldType::String))
                .field(required("SourceKey", FieldType::String))
                .field(required("DestinationBucket", FieldType::String))
                .field(required("DestinationKey", FieldType::String))
                .field(optional(
                    "MetadataDirective",
                    FieldType::Enumeration(METADATA_DIRECTIVES),
                ))
                .field(optional("Metadata", record(METADATA_ENTRY)).repeated())
                .field(optional("AccessControlList", record(ACCESS_CONTROL_LIST)))
                .field(
                    optional("CopySourceIfModifiedSince", FieldType::Timestamp)
                        .in_choice(IF_MODIFIED),
                )
                .field(
                    optional("CopySourceIfUnmodifiedSince", FieldType::Timestamp)
                        .in_choice(IF_MODIFIED),
                )
                .field(
                    optional("CopySourceIfMatch", FieldType::String)
                        .repeated()
                        .in_choice(IF_MATCH),
                )
                .field(
                    optional("CopySourceIfNoneMatch", FieldType::String)
                        .repeated()
                        .in_choice(IF_MATCH),
                )
                .field(optional("StorageClass", FieldType::Enumeration(STORAGE_CLASSES)))
                .fields(authentication(true)),
        };
        builder.build()
    }

    /// Schema of the response element.
    #[must_use]
    pub fn response_schema(&self) -> RecordSchema {
        let builder = RecordSchema::builder(self.response_element());
        match self.response_return() {
            Some((child, type_name)) => builder.field(required(child, record(type_name))).build(),
            None => builder.build(),
        }
    }
}

impl fmt::Display for S3SoapOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request signature fields shared by every operation.
fn authentication(with_credential: bool) -> Vec<FieldDescriptor> {
    let mut fields = vec![
        optional("AWSAccessKeyId", FieldType::String),
        optional("Timestamp", FieldType::Timestamp),
        optional("Signature", FieldType::String),
    ];
    if with_credential {
        fields.push(optional("Credential", FieldType::String));
    }
    fields
}

/// Leading fields of `GetObject` and `GetObjectExtended`.
fn object_retrieval() -> [FieldDescriptor; 5] {
    [
        required("Bucket", FieldType::String),
        required("Key", FieldType::String),
        required("GetMetadata", FieldType::Boolean),
        required("GetData", FieldType::Boolean),
        required("InlineData", FieldType::Boolean),
    ]
}

/// Register the request and response schemas of every operation.
///
/// # Errors
///
/// Returns an error if a schema is already registered or fails validation.
pub fn register_operations(registry: &mut TypeRegistry) -> Result<(), XmlBindError> {
    for op in S3SoapOperation::ALL {
        registry.register(op.request_schema())?;
        registry.register(op.response_schema())?;
    }
    Ok(())
}
