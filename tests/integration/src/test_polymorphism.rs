//! `xsi:type` polymorphism integration tests on the grantee hierarchy.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ruststack_s3_soap_model::S3SoapOperation;
    use ruststack_s3_soap_model::beans::{Grant, Grantee, Permission};
    use ruststack_s3_soap_model::types::{ACCESS_CONTROL_LIST, ACCESS_CONTROL_POLICY, GROUP, STATUS, s3};
    use ruststack_xml_binding::{
        CodecConfig, ErrorKind, FieldDescriptor, FieldType, Record, RecordSchema, TypeRegistry,
        Value, XmlBindError, XmlRecord, from_xml, to_xml,
    };

    use crate::{round_trip, s3_payload, s3_registry};

    fn policy_response(registry: &TypeRegistry, grants: &[Grant]) -> Record {
        let owner = Grantee::CanonicalUser {
            id: "a9a7b886d6fd24a52fe8ca5bef65f89a64e0193f23000e241bf9b1c61be666e9".to_owned(),
            display_name: Some("chriscustomer".to_owned()),
        }
        .to_record(registry)
        .expect("owner");
        let items = grants
            .iter()
            .map(|g| g.to_record(registry).map(Value::from))
            .collect::<Result<Vec<_>, _>>()
            .expect("grants");
        let acl = registry
            .new_record(&ACCESS_CONTROL_LIST)
            .and_then(|r| r.with("Grant", Value::Array(items)))
            .expect("acl");
        let policy = registry
            .new_record(&ACCESS_CONTROL_POLICY)
            .and_then(|r| r.with("Owner", owner))
            .and_then(|r| r.with("AccessControlList", acl))
            .expect("policy");
        registry
            .new_record(&S3SoapOperation::GetBucketAccessControlPolicy.response_element())
            .and_then(|r| r.with("GetBucketAccessControlPolicyResponse", policy))
            .expect("response")
    }

    fn parsed_grants(response: &Record) -> Vec<Grant> {
        let policy = response
            .get("GetBucketAccessControlPolicyResponse")
            .expect("known field")
            .and_then(Value::as_record)
            .expect("policy");
        let acl = policy
            .get("AccessControlList")
            .expect("known field")
            .and_then(Value::as_record)
            .expect("acl");
        acl.get("Grant")
            .expect("known field")
            .and_then(Value::as_array)
            .unwrap_or_default()
            .iter()
            .map(|item| Grant::from_record(item.as_record().expect("record")).expect("grant"))
            .collect()
    }

    #[test]
    fn test_should_round_trip_mixed_grantee_subtypes() {
        let registry = s3_registry();
        let grants = vec![
            Grant {
                grantee: Grantee::CanonicalUser {
                    id: "a9a7b886".to_owned(),
                    display_name: None,
                },
                permission: Permission::FullControl,
            },
            Grant {
                grantee: Grantee::Group {
                    uri: "http://acs.amazonaws.com/groups/global/AllUsers".to_owned(),
                },
                permission: Permission::Read,
            },
            Grant {
                grantee: Grantee::AmazonCustomerByEmail {
                    email_address: "chriscustomer@email.com".to_owned(),
                },
                permission: Permission::WriteAcp,
            },
        ];
        let response = policy_response(&registry, &grants);
        let element = S3SoapOperation::GetBucketAccessControlPolicy.response_element();

        let (xml, parsed) = round_trip(&response, &element, &registry, &CodecConfig::default());
        assert!(xml.contains("xsi:type=\"ns1:CanonicalUser\""));
        assert!(xml.contains("xsi:type=\"ns1:Group\""));
        assert!(xml.contains("xsi:type=\"ns1:AmazonCustomerByEmail\""));
        assert!(!xml.contains("ns1:Owner xsi:type"), "Owner is statically CanonicalUser");
        assert_eq!(parsed, response);
        assert_eq!(parsed_grants(&parsed), grants);
    }

    #[test]
    fn test_should_build_subtype_record_from_xsi_type() {
        let registry = s3_registry();
        let element = S3SoapOperation::SetObjectAccessControlPolicy.request_element();
        let xml = s3_payload(
            r#"<SetObjectAccessControlPolicy xmlns="{ns}"
                   xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                 <Bucket>photos</Bucket>
                 <Key>cat.jpg</Key>
                 <AccessControlList>
                   <Grant>
                     <Grantee xsi:type="Group"><URI>http://acs.amazonaws.com/groups/s3/LogDelivery</URI></Grantee>
                     <Permission>WRITE</Permission>
                   </Grant>
                 </AccessControlList>
               </SetObjectAccessControlPolicy>"#,
        );

        let record = from_xml(&xml, &element, &element, &registry, &CodecConfig::default())
            .expect("parse");
        let acl = record
            .get("AccessControlList")
            .expect("known field")
            .and_then(Value::as_record)
            .expect("acl");
        let grant = acl
            .get("Grant")
            .expect("known field")
            .and_then(Value::as_array)
            .and_then(<[Value]>::first)
            .and_then(Value::as_record)
            .expect("grant");
        let grantee = grant
            .get("Grantee")
            .expect("known field")
            .and_then(Value::as_record)
            .expect("grantee");
        assert_eq!(grantee.type_name(), &GROUP);
        assert_eq!(
            grantee.get("URI").expect("known field").and_then(Value::as_str),
            Some("http://acs.amazonaws.com/groups/s3/LogDelivery")
        );
        assert!(grantee.schema().field("ID").is_none());
    }

    #[test]
    fn test_should_fail_on_unregistered_xsi_type() {
        let registry = s3_registry();
        let element = S3SoapOperation::SetBucketAccessControlPolicy.request_element();
        let xml = s3_payload(
            r#"<SetBucketAccessControlPolicy xmlns="{ns}"
                   xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                 <Bucket>photos</Bucket>
                 <AccessControlList><Grant>
                   <Grantee xsi:type="Robot"><ID>r2d2</ID></Grantee>
                   <Permission>READ</Permission>
                 </Grant></AccessControlList>
               </SetBucketAccessControlPolicy>"#,
        );

        let err = from_xml(&xml, &element, &element, &registry, &CodecConfig::default())
            .expect_err("Robot is not registered");
        assert!(matches!(err, XmlBindError::UnknownType(ref name) if name.local_name() == "Robot"));
        assert_eq!(err.kind(), ErrorKind::UnknownType);
    }

    #[test]
    fn test_should_require_xsi_type_for_abstract_grantee() {
        let registry = s3_registry();
        let element = S3SoapOperation::SetBucketAccessControlPolicy.request_element();
        let xml = s3_payload(
            r#"<SetBucketAccessControlPolicy xmlns="{ns}">
                 <Bucket>photos</Bucket>
                 <AccessControlList><Grant>
                   <Grantee><ID>a9a7b886</ID></Grantee>
                   <Permission>READ</Permission>
                 </Grant></AccessControlList>
               </SetBucketAccessControlPolicy>"#,
        );

        let err = from_xml(&xml, &element, &element, &registry, &CodecConfig::default())
            .expect_err("Grantee is abstract");
        assert!(matches!(err, XmlBindError::AbstractType(_)));
    }

    #[test]
    fn test_should_reject_unrelated_substitution() {
        let registry = s3_registry();
        let element = S3SoapOperation::SetBucketAccessControlPolicy.request_element();
        let xml = s3_payload(
            r#"<SetBucketAccessControlPolicy xmlns="{ns}"
                   xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                 <Bucket>photos</Bucket>
                 <AccessControlList><Grant>
                   <Grantee xsi:type="Status"><Code>200</Code><Description>OK</Description></Grantee>
                   <Permission>READ</Permission>
                 </Grant></AccessControlList>
               </SetBucketAccessControlPolicy>"#,
        );

        let err = from_xml(&xml, &element, &element, &registry, &CodecConfig::default())
            .expect_err("Status is not a Grantee");
        assert!(matches!(err, XmlBindError::InvalidSubstitution { .. }));
    }

    #[test]
    fn test_should_reject_unknown_permission() {
        let registry = s3_registry();
        let element = S3SoapOperation::SetBucketAccessControlPolicy.request_element();
        let xml = s3_payload(
            r#"<SetBucketAccessControlPolicy xmlns="{ns}"
                   xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
                 <Bucket>photos</Bucket>
                 <AccessControlList><Grant>
                   <Grantee xsi:type="CanonicalUser"><ID>a9a7b886</ID></Grantee>
                   <Permission>OWN</Permission>
                 </Grant></AccessControlList>
               </SetBucketAccessControlPolicy>"#,
        );

        let err = from_xml(&xml, &element, &element, &registry, &CodecConfig::default())
            .expect_err("OWN is not a permission");
        assert_eq!(err.kind(), ErrorKind::TypeConversion);
    }

    #[test]
    fn test_should_round_trip_subtype_at_document_root() {
        let mut registry = s3_registry();
        let status = Arc::clone(registry.resolve(&STATUS).expect("Status"));
        let detailed = s3("DetailedStatus");
        registry
            .register(
                RecordSchema::extending(detailed.clone(), &status)
                    .field(FieldDescriptor::optional(s3("RetryAfter"), FieldType::Int))
                    .build(),
            )
            .expect("register DetailedStatus");
        let record = registry
            .new_record(&detailed)
            .and_then(|r| r.with("Code", 503))
            .and_then(|r| r.with("Description", "Slow Down"))
            .and_then(|r| r.with("RetryAfter", 2))
            .expect("record");
        let config = CodecConfig::builder().xml_declaration(false).build();

        let xml = to_xml(&record, &STATUS, &STATUS, &config).expect("serialize");
        let text = String::from_utf8(xml.clone()).expect("valid UTF-8");
        assert!(text.starts_with("<ns1:Status "), "{text}");
        assert!(text.contains("xsi:type=\"ns1:DetailedStatus\""), "{text}");

        let parsed = from_xml(&xml, &STATUS, &STATUS, &registry, &config).expect("parse");
        assert_eq!(parsed.type_name(), &detailed);
        assert_eq!(parsed, record);
    }
}
