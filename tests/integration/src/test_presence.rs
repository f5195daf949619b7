//! Presence tracking, schema order and required-field integration tests.

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use ruststack_s3_soap_model::S3SoapOperation;
    use ruststack_s3_soap_model::types::{METADATA_ENTRY, s3};
    use ruststack_xml_binding::{
        CodecConfig, ErrorKind, FieldDescriptor, FieldType, RecordSchema, Value, from_xml, to_xml,
    };

    use crate::{occurrences, round_trip, s3_payload, s3_registry};

    #[test]
    fn test_should_omit_unset_and_empty_fields_for_photos_upload() {
        let mut registry = s3_registry();
        let upload = s3("PhotoUpload");
        registry
            .register(
                RecordSchema::builder(upload.clone())
                    .field(FieldDescriptor::required(s3("Bucket"), FieldType::String))
                    .field(FieldDescriptor::optional(
                        s3("AWSAccessKeyId"),
                        FieldType::String,
                    ))
                    .field(
                        FieldDescriptor::required(s3("Metadata"), FieldType::Record(METADATA_ENTRY))
                            .repeated(),
                    )
                    .build(),
            )
            .expect("register PhotoUpload");

        let record = registry
            .new_record(&upload)
            .and_then(|r| r.with("Bucket", "photos"))
            .and_then(|r| r.with("Metadata", Value::Array(Vec::new())))
            .expect("valid record");

        let config = CodecConfig::builder().xml_declaration(false).build();
        let (xml, parsed) = round_trip(&record, &upload, &registry, &config);

        assert_eq!(occurrences(&xml, ":Bucket>photos</"), 1);
        assert!(!xml.contains("AWSAccessKeyId"));
        assert!(!xml.contains("Metadata"));

        assert_eq!(parsed.tracked_fields(), vec!["Bucket", "Metadata"]);
        assert!(!parsed.is_set("AWSAccessKeyId").expect("known field"));
        assert_eq!(
            parsed.get("Metadata").expect("known field"),
            Some(&Value::Array(Vec::new()))
        );
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_should_leave_optional_empty_array_unset_after_parse() {
        let registry = s3_registry();
        let element = S3SoapOperation::PutObject.request_element();
        let record = registry
            .new_record(&element)
            .and_then(|r| r.with("Bucket", "photos"))
            .and_then(|r| r.with("Key", "cat.jpg"))
            .and_then(|r| r.with("Metadata", Value::Array(Vec::new())))
            .and_then(|r| r.with("ContentLength", 0_i64))
            .expect("valid record");

        let (xml, parsed) = round_trip(&record, &element, &registry, &CodecConfig::default());
        assert!(!xml.contains("Metadata"));
        assert!(xml.contains(":ContentLength>0</"));
        assert!(!parsed.is_set("Metadata").expect("known field"));
        assert_eq!(parsed.tracked_fields(), vec!["Bucket", "Key", "ContentLength"]);
    }

    #[test]
    fn test_should_round_trip_all_unset_and_all_set_optionals() {
        let registry = s3_registry();
        let element = S3SoapOperation::ListBucket.request_element();
        let config = CodecConfig::default();

        let minimal = registry
            .new_record(&element)
            .and_then(|r| r.with("Bucket", "photos"))
            .expect("valid record");
        let (_, parsed) = round_trip(&minimal, &element, &registry, &config);
        assert_eq!(parsed, minimal);
        assert_eq!(parsed.tracked_fields(), vec!["Bucket"]);

        let full = registry
            .new_record(&element)
            .and_then(|r| r.with("Bucket", "photos"))
            .and_then(|r| r.with("Prefix", ""))
            .and_then(|r| r.with("Marker", "2006/"))
            .and_then(|r| r.with("MaxKeys", 0))
            .and_then(|r| r.with("Delimiter", "/"))
            .and_then(|r| r.with("AWSAccessKeyId", "AKID"))
            .and_then(|r| r.with("Timestamp", Utc.with_ymd_and_hms(2006, 3, 1, 12, 0, 0).unwrap()))
            .and_then(|r| r.with("Signature", "c2lnbmF0dXJl"))
            .and_then(|r| r.with("Credential", "cred"))
            .expect("valid record");
        let (xml, parsed) = round_trip(&full, &element, &registry, &config);
        assert!(xml.contains(":Prefix></"), "empty string is still emitted");
        assert_eq!(parsed, full);
    }

    #[test]
    fn test_should_emit_schema_order_regardless_of_set_order() {
        let registry = s3_registry();
        let element = S3SoapOperation::ListBucket.request_element();
        let mut record = registry.new_record(&element).expect("record");
        record.set("Credential", "cred").expect("set");
        record.set("Delimiter", "/").expect("set");
        record.set("MaxKeys", 100).expect("set");
        record.set("Bucket", "photos").expect("set");

        let xml =
            to_xml(&record, &element, &element, &CodecConfig::default()).expect("serialize");
        let xml = String::from_utf8(xml).expect("valid UTF-8");
        let positions: Vec<usize> = ["Bucket>", "MaxKeys>", "Delimiter>", "Credential>"]
            .iter()
            .map(|tag| xml.find(tag).expect("element present"))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{xml}");
    }

    #[test]
    fn test_should_fail_on_missing_required_field_both_ways() {
        let registry = s3_registry();
        let element = S3SoapOperation::CreateBucket.request_element();
        let config = CodecConfig::default();

        let record = registry
            .new_record(&element)
            .and_then(|r| r.with("AWSAccessKeyId", "AKID"))
            .expect("valid record");
        let err =
            to_xml(&record, &element, &element, &config).expect_err("Bucket is required");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);

        let xml = s3_payload(
            r#"<CreateBucket xmlns="{ns}"><AWSAccessKeyId>AKID</AWSAccessKeyId></CreateBucket>"#,
        );
        let err = from_xml(&xml, &element, &element, &registry, &config)
            .expect_err("Bucket is required");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredField);
    }

    #[test]
    fn test_should_not_let_absent_optional_consume_next_element() {
        let registry = s3_registry();
        let element = S3SoapOperation::ListBucket.request_element();
        let xml = s3_payload(
            r#"<ListBucket xmlns="{ns}">
                 <Bucket>photos</Bucket>
                 <MaxKeys>5</MaxKeys>
                 <Signature>sig</Signature>
               </ListBucket>"#,
        );

        let record = from_xml(&xml, &element, &element, &registry, &CodecConfig::default())
            .expect("parse");
        assert_eq!(record.tracked_fields(), vec!["Bucket", "MaxKeys", "Signature"]);
        assert!(!record.is_set("Prefix").expect("known field"));
        assert_eq!(record.get("MaxKeys").expect("known field"), Some(&Value::Int(5)));
    }

    #[test]
    fn test_should_reject_out_of_order_and_foreign_elements() {
        let registry = s3_registry();
        let element = S3SoapOperation::ListBucket.request_element();
        let config = CodecConfig::default();

        let out_of_order = s3_payload(
            r#"<ListBucket xmlns="{ns}"><Bucket>photos</Bucket><Delimiter>/</Delimiter><Prefix>a</Prefix></ListBucket>"#,
        );
        let err = from_xml(&out_of_order, &element, &element, &registry, &config)
            .expect_err("Prefix after Delimiter");
        assert_eq!(err.kind(), ErrorKind::UnexpectedElement);

        let trailing = s3_payload(
            r#"<ListBucket xmlns="{ns}"><Bucket>photos</Bucket><Credential>c</Credential><Signature>s</Signature></ListBucket>"#,
        );
        let err = from_xml(&trailing, &element, &element, &registry, &config)
            .expect_err("Signature after the last field");
        assert_eq!(err.kind(), ErrorKind::UnexpectedTrailingElement);

        let foreign = s3_payload(
            r#"<ListBucket xmlns="{ns}"><Bucket>photos</Bucket><Owner>me</Owner><MaxKeys>1</MaxKeys></ListBucket>"#,
        );
        let err = from_xml(&foreign, &element, &element, &registry, &config)
            .expect_err("Owner is not a ListBucket field");
        assert_eq!(err.kind(), ErrorKind::UnexpectedElement);
    }

    #[test]
    fn test_should_reject_malformed_primitives() {
        let registry = s3_registry();
        let element = S3SoapOperation::ListBucket.request_element();
        let xml = s3_payload(
            r#"<ListBucket xmlns="{ns}"><Bucket>photos</Bucket><MaxKeys>many</MaxKeys></ListBucket>"#,
        );

        let err = from_xml(&xml, &element, &element, &registry, &CodecConfig::default())
            .expect_err("MaxKeys is an int");
        assert_eq!(err.kind(), ErrorKind::TypeConversion);
        assert_eq!(err.kind().fault_code(), "Client");
    }

    #[test]
    fn test_should_round_trip_sub_millisecond_timestamp() {
        let registry = s3_registry();
        let element = S3SoapOperation::CreateBucket.request_element();
        let timestamp = Utc.with_ymd_and_hms(2006, 3, 1, 12, 0, 0).unwrap()
            + chrono::Duration::microseconds(123_456);
        let record = registry
            .new_record(&element)
            .and_then(|r| r.with("Bucket", "photos"))
            .and_then(|r| r.with("Timestamp", timestamp))
            .expect("valid record");

        let (xml, parsed) = round_trip(&record, &element, &registry, &CodecConfig::default());
        assert!(xml.contains(":Timestamp>2006-03-01T12:00:00.123456Z</"), "{xml}");
        assert_eq!(parsed, record);
    }
}
