//! Value Codec Tests
//!
//! Tests verify:
//! - JSON encoding of every value kind
//! - Byte strings as `{"$bytes": "<hex>"}`
//! - Malformed payloads and unencodable values are codec errors

use std::collections::BTreeMap;

use bytes::Bytes;
use flowkv::codec::{Codec, JsonCodec};
use flowkv::{FlowError, Value};

#[test]
fn test_encode_primitives() {
    let codec = JsonCodec;
    assert_eq!(codec.encode(&Value::Null).unwrap(), b"null");
    assert_eq!(codec.encode(&Value::Bool(false)).unwrap(), b"false");
    assert_eq!(codec.encode(&Value::Int(7)).unwrap(), b"7");
    assert_eq!(codec.encode(&Value::from("hi")).unwrap(), b"\"hi\"");
    assert_eq!(codec.encode(&Value::from(vec![1, 2])).unwrap(), b"[1,2]");
}

#[test]
fn test_bytes_are_hex_objects() {
    let codec = JsonCodec;
    let value = Value::Bytes(Bytes::from_static(&[0xDE, 0xAD, 0x00]));

    let encoded = codec.encode(&value).unwrap();

    assert_eq!(encoded, br#"{"$bytes":"dead00"}"#);
    assert_eq!(codec.decode(&encoded).unwrap(), value);
}

#[test]
fn test_object_with_extra_keys_stays_a_map() {
    let codec = JsonCodec;
    let decoded = codec.decode(br#"{"$bytes":"00","other":1}"#).unwrap();

    let mut expected = BTreeMap::new();
    expected.insert("$bytes".to_string(), Value::from("00"));
    expected.insert("other".to_string(), Value::Int(1));
    assert_eq!(decoded, Value::Map(expected));
}

#[test]
fn test_numbers() {
    let codec = JsonCodec;
    assert_eq!(codec.decode(b"1.5").unwrap(), Value::Float(1.5));
    assert_eq!(codec.decode(b"-3").unwrap(), Value::Int(-3));
    // Beyond i64
    assert_eq!(
        codec.decode(b"18446744073709551615").unwrap(),
        Value::Float(18446744073709551615.0)
    );
}

#[test]
fn test_decode_errors() {
    let codec = JsonCodec;
    assert!(matches!(codec.decode(b"{oops"), Err(FlowError::Codec(_))));
    assert!(matches!(codec.decode(b""), Err(FlowError::Codec(_))));
    assert!(matches!(
        codec.decode(br#"{"$bytes":"zz"}"#),
        Err(FlowError::Codec(_))
    ));
}

#[test]
fn test_non_finite_float_cannot_be_encoded() {
    let codec = JsonCodec;
    assert!(matches!(
        codec.encode(&Value::Float(f64::NAN)),
        Err(FlowError::Codec(_))
    ));
}

#[test]
fn test_value_accessors_and_display() {
    let value = Value::from("auto");
    assert_eq!(value.as_str(), Some("auto"));
    assert_eq!(value.as_i64(), None);
    assert_eq!(Value::Int(3).as_i64(), Some(3));
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert!(Value::Null.is_null());
    assert_eq!(value.to_string(), "\"auto\"");
}

#[test]
fn test_maps_shaped_like_markers_round_trip() {
    let codec = JsonCodec;
    let single = |key: &str, value: Value| {
        let mut entries = BTreeMap::new();
        entries.insert(key.to_string(), value);
        Value::Map(entries)
    };

    let cases = vec![
        single("$bytes", Value::from("abcd")),
        single("$bytes", Value::from("hello")),
        single("$bytes", Value::Int(3)),
        single("$map", Value::from("x")),
        single("$map", single("$bytes", Value::from("00"))),
        Value::from(vec![single("$bytes", Value::from("ff"))]),
    ];
    for value in cases {
        let encoded = codec.encode(&value).unwrap();
        assert_eq!(codec.decode(&encoded).unwrap(), value);
    }

    // Real byte strings keep their plain form
    let bytes = Value::Bytes(Bytes::from_static(&[0xAB, 0xCD]));
    assert_eq!(codec.encode(&bytes).unwrap(), br#"{"$bytes":"abcd"}"#);
    assert_eq!(
        codec.encode(&single("$bytes", Value::from("abcd"))).unwrap(),
        br#"{"$map":{"$bytes":"abcd"}}"#
    );
}
