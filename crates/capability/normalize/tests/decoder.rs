use chrono::{TimeZone, Utc};
use domain::FieldValue;
use mbridge_normalize::{DecodeError, MessageDecoder, ParseError};

fn decoder() -> MessageDecoder {
    MessageDecoder::new("machine/+/realtime")
}

#[test]
fn decodes_machine_identifier_and_millisecond_timestamp() {
    let payload = br#"{"timestamp":"1770014810462","temperature":21.5,"status":"run","count":7}"#;
    let decoded = decoder()
        .decode("machine/42/realtime", payload)
        .expect("decoded");
    assert_eq!(decoded.machine_id, "42");
    let event_time = decoded.event_time.expect("event time");
    assert_eq!(event_time.timestamp_millis(), 1_770_014_810_462);
    assert_eq!(decoded.fields.len(), 3);
    assert_eq!(decoded.fields.get("temperature"), Some(&FieldValue::F64(21.5)));
    assert_eq!(
        decoded.fields.get("status"),
        Some(&FieldValue::String("run".to_string()))
    );
    assert_eq!(decoded.fields.get("count"), Some(&FieldValue::I64(7)));
    assert!(!decoded.fields.contains_key("timestamp"));
}

#[test]
fn accepts_integer_and_rfc3339_timestamps() {
    let decoded = decoder()
        .decode("machine/a1/realtime", br#"{"ts":1700000000,"running":true}"#)
        .expect("decoded");
    assert_eq!(
        decoded.event_time,
        Some(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    );
    assert_eq!(decoded.fields.get("running"), Some(&FieldValue::Bool(true)));

    let decoded = decoder()
        .decode(
            "machine/a1/realtime",
            br#"{"time":"2024-01-01T00:00:00Z","rpm":1200}"#,
        )
        .expect("decoded");
    assert_eq!(
        decoded.event_time,
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    );
}

#[test]
fn missing_or_empty_timestamp_is_absent() {
    let decoded = decoder()
        .decode("machine/7/realtime", br#"{"rpm":1200}"#)
        .expect("decoded");
    assert_eq!(decoded.event_time, None);

    let decoded = decoder()
        .decode("machine/7/realtime", br#"{"timestamp":"","rpm":1200}"#)
        .expect("decoded");
    assert_eq!(decoded.event_time, None);

    let decoded = decoder()
        .decode("machine/7/realtime", br#"{"timestamp":null,"rpm":1200}"#)
        .expect("decoded");
    assert_eq!(decoded.event_time, None);
}

#[test]
fn malformed_timestamp_propagates_parse_error() {
    let err = decoder()
        .decode(
            "machine/7/realtime",
            br#"{"timestamp":"yesterday","rpm":1200}"#,
        )
        .expect_err("bad timestamp");
    assert_eq!(
        err,
        DecodeError::InvalidTimestamp(ParseError::Malformed("yesterday".to_string()))
    );

    let err = decoder()
        .decode("machine/7/realtime", br#"{"timestamp":1.5,"rpm":1200}"#)
        .expect_err("float timestamp");
    assert_eq!(err, DecodeError::TimestampType("timestamp".to_string()));
}

#[test]
fn nested_fields_are_flattened_and_nulls_skipped() {
    let decoded = decoder()
        .decode(
            "machine/7/realtime",
            br#"{"spindle":{"speed":1200,"temp":{"c":40.5}},"alarm":null}"#,
        )
        .expect("decoded");
    assert_eq!(decoded.fields.get("spindle.speed"), Some(&FieldValue::I64(1200)));
    assert_eq!(decoded.fields.get("spindle.temp.c"), Some(&FieldValue::F64(40.5)));
    assert!(!decoded.fields.contains_key("alarm"));
}

#[test]
fn malformed_payloads_are_rejected() {
    let decoder = decoder();
    assert!(matches!(
        decoder.decode("machine/7/realtime", b"not json"),
        Err(DecodeError::InvalidPayload(_))
    ));
    assert!(matches!(
        decoder.decode("machine/7/realtime", &[0xff, 0xfe]),
        Err(DecodeError::InvalidPayload(_))
    ));
    assert_eq!(
        decoder.decode("machine/7/realtime", b"[1,2]"),
        Err(DecodeError::NotAnObject)
    );
    assert_eq!(
        decoder.decode("machine/7/realtime", br#"{"timestamp":"1700000000"}"#),
        Err(DecodeError::MissingFields)
    );
    assert_eq!(
        decoder.decode("machine/7/realtime", br#"{"axes":[1,2,3]}"#),
        Err(DecodeError::UnsupportedField("axes".to_string()))
    );
}

#[test]
fn topic_must_match_and_carry_identifier() {
    let decoder = decoder();
    assert!(matches!(
        decoder.decode("plant/7/realtime", br#"{"rpm":1}"#),
        Err(DecodeError::TopicMismatch { .. })
    ));
    assert_eq!(
        decoder.decode("machine//realtime", br#"{"rpm":1}"#),
        Err(DecodeError::MissingIdentifier("machine//realtime".to_string()))
    );
}

#[test]
fn line_breaks_in_identifier_or_keys_are_rejected() {
    let decoder = decoder();
    assert_eq!(
        decoder.decode("machine/4\n2/realtime", br#"{"a":1}"#),
        Err(DecodeError::MissingIdentifier("machine/4\n2/realtime".to_string()))
    );
    assert_eq!(
        decoder.decode("machine/4\r2/realtime", br#"{"a":1}"#),
        Err(DecodeError::MissingIdentifier("machine/4\r2/realtime".to_string()))
    );
    assert_eq!(
        decoder.decode("machine/42/realtime", br#"{"a\nb":1}"#),
        Err(DecodeError::InvalidFieldKey("a\nb".to_string()))
    );
    assert_eq!(
        decoder.decode("machine/42/realtime", br#"{"spindle":{"x\ny":1}}"#),
        Err(DecodeError::InvalidFieldKey("spindle.x\ny".to_string()))
    );
}
