//! Repeated-element integration tests on bucket listings.

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use ruststack_s3_soap_model::S3SoapOperation;
    use ruststack_s3_soap_model::types::{
        CANONICAL_USER, LIST_ALL_MY_BUCKETS_ENTRY, LIST_ALL_MY_BUCKETS_LIST,
        LIST_ALL_MY_BUCKETS_RESULT, LIST_BUCKET_RESULT, LIST_ENTRY, PREFIX_ENTRY,
    };
    use ruststack_xml_binding::{CodecConfig, Record, TypeRegistry, Value};

    use crate::{occurrences, round_trip, s3_registry};

    fn list_entry(registry: &TypeRegistry, key: &str, size: i64) -> Record {
        registry
            .new_record(&LIST_ENTRY)
            .and_then(|r| r.with("Key", key))
            .and_then(|r| r.with("LastModified", Utc.with_ymd_and_hms(2006, 1, 1, 12, 0, 0).unwrap()))
            .and_then(|r| r.with("ETag", "\"828ef3fdfa96f00ad9f27c383fc9ac7f\""))
            .and_then(|r| r.with("Size", size))
            .and_then(|r| r.with("StorageClass", "STANDARD"))
            .expect("list entry")
    }

    fn list_bucket_response(registry: &TypeRegistry, contents: Option<Vec<Record>>) -> Record {
        let mut result = registry
            .new_record(&LIST_BUCKET_RESULT)
            .and_then(|r| r.with("Name", "photos"))
            .and_then(|r| r.with("Prefix", ""))
            .and_then(|r| r.with("Marker", ""))
            .and_then(|r| r.with("MaxKeys", 1000))
            .and_then(|r| r.with("IsTruncated", false))
            .expect("result");
        if let Some(contents) = contents {
            result
                .set("Contents", Value::array(contents))
                .expect("contents");
        }
        registry
            .new_record(&S3SoapOperation::ListBucket.response_element())
            .and_then(|r| r.with("ListBucketResponse", result))
            .expect("response")
    }

    fn contents_of(response: &Record) -> Option<usize> {
        response
            .get("ListBucketResponse")
            .expect("known field")
            .and_then(Value::as_record)
            .expect("result")
            .get("Contents")
            .expect("known field")
            .and_then(Value::as_array)
            .map(<[Value]>::len)
    }

    #[test]
    fn test_should_round_trip_arrays_of_one_and_many() {
        let registry = s3_registry();
        let element = S3SoapOperation::ListBucket.response_element();
        let config = CodecConfig::default();

        let one = list_bucket_response(&registry, Some(vec![list_entry(&registry, "a.jpg", 1)]));
        let (xml, parsed) = round_trip(&one, &element, &registry, &config);
        assert_eq!(occurrences(&xml, "<ns1:Contents>"), 1);
        assert_eq!(contents_of(&parsed), Some(1));
        assert_eq!(parsed, one);

        let many = list_bucket_response(
            &registry,
            Some(
                (0..5)
                    .map(|i| list_entry(&registry, &format!("photo-{i}.jpg"), i64::from(i) << 32))
                    .collect(),
            ),
        );
        let (xml, parsed) = round_trip(&many, &element, &registry, &config);
        assert_eq!(occurrences(&xml, "<ns1:Contents>"), 5);
        assert!(xml.contains(":Size>17179869184</"), "64-bit sizes survive");
        assert_eq!(contents_of(&parsed), Some(5));
        assert_eq!(parsed, many);
    }

    #[test]
    fn test_should_emit_nothing_for_empty_contents() {
        let registry = s3_registry();
        let element = S3SoapOperation::ListBucket.response_element();

        let empty = list_bucket_response(&registry, Some(Vec::new()));
        let (xml, parsed) = round_trip(&empty, &element, &registry, &CodecConfig::default());
        assert!(!xml.contains("Contents"));
        assert_eq!(contents_of(&parsed), None);

        let unset = list_bucket_response(&registry, None);
        let (_, parsed) = round_trip(&unset, &element, &registry, &CodecConfig::default());
        assert_eq!(parsed, unset);
    }

    #[test]
    fn test_should_keep_common_prefixes_after_contents() {
        let registry = s3_registry();
        let element = S3SoapOperation::ListBucket.response_element();
        let prefix = registry
            .new_record(&PREFIX_ENTRY)
            .and_then(|r| r.with("Prefix", "2006/"))
            .expect("prefix");
        let mut response = list_bucket_response(&registry, Some(vec![list_entry(&registry, "a", 3)]));
        let mut result = response
            .get("ListBucketResponse")
            .expect("known field")
            .and_then(Value::as_record)
            .cloned()
            .expect("result");
        result
            .set("CommonPrefixes", Value::array([prefix]))
            .and_then(|r| r.set("Delimiter", "/"))
            .expect("set");
        response.set("ListBucketResponse", result).expect("set");

        let (xml, parsed) = round_trip(&response, &element, &registry, &CodecConfig::default());
        let contents = xml.find(":Contents>").expect("contents");
        let prefixes = xml.find(":CommonPrefixes>").expect("prefixes");
        assert!(contents < prefixes);
        assert!(xml.find(":Delimiter>").expect("delimiter") < contents);
        assert_eq!(parsed, response);
    }

    #[test]
    fn test_should_round_trip_all_my_buckets() {
        let registry = s3_registry();
        let owner = registry
            .new_record(&CANONICAL_USER)
            .and_then(|r| r.with("ID", "bcaf1ffd86f41161ca5fb16fd081034f"))
            .and_then(|r| r.with("DisplayName", "webfile"))
            .expect("owner");
        let buckets = ["photos", "videos", "docs"]
            .into_iter()
            .map(|name| {
                registry
                    .new_record(&LIST_ALL_MY_BUCKETS_ENTRY)
                    .and_then(|r| r.with("Name", name))
                    .and_then(|r| {
                        r.with("CreationDate", Utc.with_ymd_and_hms(2006, 2, 3, 16, 45, 9).unwrap())
                    })
                    .expect("entry")
            })
            .collect::<Vec<_>>();
        let list = registry
            .new_record(&LIST_ALL_MY_BUCKETS_LIST)
            .and_then(|r| r.with("Bucket", Value::array(buckets)))
            .expect("list");
        let result = registry
            .new_record(&LIST_ALL_MY_BUCKETS_RESULT)
            .and_then(|r| r.with("Owner", owner))
            .and_then(|r| r.with("Buckets", list))
            .expect("result");
        let element = S3SoapOperation::ListAllMyBuckets.response_element();
        let response = registry
            .new_record(&element)
            .and_then(|r| r.with("ListAllMyBucketsResponse", result))
            .expect("response");

        let (xml, parsed) = round_trip(&response, &element, &registry, &CodecConfig::default());
        assert_eq!(occurrences(&xml, "<ns1:Bucket>"), 3);
        assert!(xml.contains(":CreationDate>2006-02-03T16:45:09.000Z</"));
        assert_eq!(parsed, response);
    }
}
