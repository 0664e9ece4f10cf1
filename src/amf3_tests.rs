use bytes::{Bytes, BytesMut};

use crate::{
    Amf3Array, Amf3Config, Amf3Date, Amf3Decoder, Amf3Encoder, Amf3Object, Amf3Value,
    ClassTrait, EncodingError, decode, decode_with_config, encode, encode_with_config,
};

fn round_trip(value: &Amf3Value) -> Amf3Value {
    let encoded = encode(value).unwrap();
    decode(encoded).unwrap()
}

#[test]
fn test_string() {
    let mut encoder = Amf3Encoder::new(BytesMut::new());
    let sample_string = Amf3Value::from("kremówki");

    encoder.encode_value(&sample_string).unwrap();
    let encoded_string = encoder.finish();

    let mut decoder = Amf3Decoder::new(encoded_string);
    let decoded_string = decoder.decode_value().unwrap();

    assert_eq!(decoded_string, sample_string);
}

#[test]
fn test_integer() {
    let sample_pos = Amf3Value::Integer(2137);
    let sample_neg = Amf3Value::Integer(-2137);
    let values = [sample_pos.clone(), sample_neg.clone()];

    let mut encoder = Amf3Encoder::new(BytesMut::new());
    encoder.encode_values(&values).unwrap();
    let amf3_bytes = encoder.finish();

    let mut decoder = Amf3Decoder::new(amf3_bytes);
    let decoded_pos = decoder.decode_value().unwrap();
    let decoded_neg = decoder.decode_value().unwrap();

    assert_eq!(decoded_pos, sample_pos);
    assert_eq!(decoded_neg, sample_neg);
}

#[test]
fn test_integer_bounds() {
    for integer in [crate::I29_MIN, -1, 0, 1, crate::I29_MAX] {
        let value = Amf3Value::Integer(integer);
        assert_eq!(round_trip(&value), value);
    }
}

#[test]
fn test_primitives() {
    for value in [
        Amf3Value::Undefined,
        Amf3Value::Null,
        Amf3Value::Boolean(false),
        Amf3Value::Boolean(true),
        Amf3Value::Double(-0.5),
        Amf3Value::Double(f64::MAX),
        Amf3Value::from(""),
        Amf3Value::Date(Amf3Date::new(1_700_000_000_000.0)),
    ] {
        assert_eq!(round_trip(&value), value);
    }
}

#[test]
fn test_array() {
    let mut amf_array = Amf3Array::new();
    amf_array.insert("Integer", Amf3Value::Integer(2137));
    amf_array.insert("String", "kremówki");
    amf_array.push(Amf3Value::Double(21.37));
    let amf_array = Amf3Value::Array(amf_array);

    assert_eq!(round_trip(&amf_array), amf_array);
}

#[test]
fn test_associative_and_dense_array() {
    let mut array = Amf3Array::new();
    array.insert("a", Amf3Value::Integer(1));
    array.push("x");
    let value = Amf3Value::Array(array);

    let encoded = encode(&value).unwrap();
    let expected = Bytes::from_iter([
        0x09, 0x03, // inline array, one dense value
        0x03, b'a', 0x04, 0x01, // "a": 1
        0x01, // end of associative part
        0x06, 0x03, b'x', // "x"
    ]);
    assert_eq!(encoded, expected);

    let decoded = decode(encoded).unwrap();
    assert_eq!(decoded, value);
    let decoded = decoded.as_array().unwrap();
    assert_eq!(decoded.get_by_key("a"), Some(&Amf3Value::Integer(1)));
    assert_eq!(decoded.get(0).and_then(Amf3Value::as_str), Some("x"));
}

#[test]
fn test_string_reference_compression() {
    let repeated: Amf3Value = vec![Amf3Value::from("repeat"), Amf3Value::from("repeat")]
        .into_iter()
        .collect::<Amf3Array>()
        .into();
    let encoded = encode(&repeated).unwrap();

    let single = encode(&Amf3Value::from("repeat")).unwrap();
    // Marker, header and payload once, then a marker and a one byte reference.
    assert_eq!(encoded.len(), 3 + single.len() + 2);
    assert_eq!(&encoded[encoded.len() - 2..], &[0x06, 0x00]);

    let independent = single.len() * 2 + 3;
    assert!(encoded.len() < independent);

    assert_eq!(decode(encoded).unwrap(), repeated);
}

#[test]
fn test_object() {
    // Case with non-empty class name
    let class_trait = ClassTrait::new("Test name", ["Val1", "Val2"], true, false);
    let mut object = Amf3Object::new(class_trait);
    object.insert("Val1", Amf3Value::Null);
    object.insert("Val2", Amf3Value::Undefined);
    object.insert("Val3", "kremówki");
    object.insert("Val4", Amf3Value::Integer(2137));
    let amf_object = Amf3Value::Object(object);

    let decoded_object = round_trip(&amf_object);
    assert_eq!(decoded_object, amf_object);
    let decoded = decoded_object.as_object().unwrap();
    assert_eq!(decoded.class_trait().name(), "Test name");
    assert_eq!(decoded.dynamic_members().count(), 2);

    // Case with empty class name
    let class_trait = ClassTrait::new("", ["Val1", "Val2"], false, false);
    let mut object = Amf3Object::new(class_trait);
    object.insert("Val1", "kremówki");
    object.insert("Val2", Amf3Value::Integer(2137));
    let amf_object = Amf3Value::Object(object);

    let decoded_object = round_trip(&amf_object);
    assert_eq!(decoded_object, amf_object);
    assert!(decoded_object.as_object().unwrap().has_anonymous_trait());
}

#[test]
fn test_dynamic_anonymous_object() {
    let mut object = Amf3Object::new(ClassTrait::new(
        "",
        Vec::<&'static str>::new(),
        true,
        false,
    ));
    object.insert("k", true);
    let value = Amf3Value::Object(object);

    let encoded = encode(&value).unwrap();
    assert_eq!(encoded.last(), Some(&0x01));
    assert_eq!(decode(encoded).unwrap(), value);
}

#[test]
fn test_trait_reuse() {
    let class_trait = ClassTrait::new("Point", ["x", "y"], false, false);
    let point = |x: f64, y: f64| {
        let mut object = Amf3Object::new(class_trait.clone());
        object.insert("x", x);
        object.insert("y", y);
        Amf3Value::Object(object)
    };
    let values = [point(1.0, 2.0), point(3.0, 4.0)];

    let mut encoder = Amf3Encoder::new(BytesMut::new());
    encoder.encode_value(&values[0]).unwrap();
    let first_len = encoder.into_inner().len();

    let mut encoder = Amf3Encoder::new(BytesMut::new());
    encoder.encode_values(&values).unwrap();
    let encoded = encoder.finish();

    // Second object: marker, trait reference header, two doubles.
    let second = &encoded[first_len..];
    assert_eq!(second.len(), 1 + 1 + 2 * 9);
    assert_eq!(&second[..2], &[0x0A, 0x01]);

    let decoded = Amf3Decoder::new(encoded).decode_all().unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn test_sealed_members_in_any_insertion_order() {
    let class_trait = ClassTrait::new("Point", ["x", "y"], false, false);
    let mut object = Amf3Object::new(class_trait);
    object.insert("y", 2.0);
    object.insert("x", 1.0);
    let value = Amf3Value::Object(object);

    let decoded = round_trip(&value);
    assert_eq!(decoded, value);
    let names: Vec<_> = decoded
        .as_object()
        .unwrap()
        .members()
        .map(|(name, _)| name.clone())
        .collect();
    assert_eq!(names, vec![Bytes::from("x"), Bytes::from("y")]);
}

#[test]
fn test_nested_values() {
    let mut inner = Amf3Object::anonymous();
    inner.insert("date", Amf3Date::new(86_400_000.0));
    inner.insert("list", Amf3Array::from_dense(vec![Amf3Value::Null, Amf3Value::Double(1.5)]));

    let mut outer = Amf3Array::new();
    outer.insert("inner", inner.clone());
    outer.push(inner);
    outer.push(Amf3Array::new());
    let value = Amf3Value::Array(outer);

    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_objects_written_inline_by_default() {
    let mut object = Amf3Object::anonymous();
    object.insert("k", "v");
    let value: Amf3Value = vec![Amf3Value::from(object.clone()), Amf3Value::from(object)]
        .into_iter()
        .collect::<Amf3Array>()
        .into();

    let inline = encode(&value).unwrap();
    let config = Amf3Config::default().with_object_references(true);
    let referenced = encode_with_config(&value, &config).unwrap();

    // Object marker and a reference to object table entry 1.
    assert_eq!(&referenced[referenced.len() - 2..], &[0x0A, 0x02]);
    assert!(referenced.len() < inline.len());

    assert_eq!(decode(inline).unwrap(), value);
    assert_eq!(decode_with_config(referenced, &config).unwrap(), value);
}

#[test]
fn test_date_reference() {
    let date = Amf3Value::Date(Amf3Date::new(1_000.0));
    let values = [date.clone(), date];
    let config = Amf3Config::default().with_object_references(true);

    let mut encoder = Amf3Encoder::with_config(BytesMut::new(), config);
    encoder.encode_values(&values).unwrap();
    let encoded = encoder.finish();
    assert_eq!(encoded.len(), 10 + 2);

    let decoded = Amf3Decoder::new(encoded).decode_all().unwrap();
    assert_eq!(decoded, values);
}

#[test]
fn test_truncated_input_never_panics() {
    let mut object = Amf3Object::new(ClassTrait::new("C", ["a"], true, false));
    object.insert("a", Amf3Value::Integer(300_000));
    object.insert("b", Amf3Array::from_dense(vec!["s".into(), Amf3Value::Double(2.5)]));
    let encoded = encode(&Amf3Value::Object(object)).unwrap();

    for cut in 0..encoded.len() {
        let err = decode(encoded.slice(..cut)).unwrap_err();
        assert!(err.is_truncation(), "cut at {cut}: {err}");
    }
}

#[test]
fn test_malformed_utf8_round_trips_as_octets() {
    let value = Amf3Value::String(Bytes::from_static(&[b'a', 0xFF, b'b']));
    assert_eq!(round_trip(&value), value);
}

#[test]
fn test_dynamic_pair_repeating_sealed_name() {
    let amf_bytes = Bytes::from_static(&[
        0x0A, 0x1B, // inline object, inline dynamic trait, 1 sealed
        0x03, b'P', // class name
        0x03, b'x', // sealed member name
        0x04, 0x01, // x = 1
        0x02, 0x04, 0x02, // dynamic "x" (string reference) = 2
        0x01, // end of dynamic members
    ]);

    let decoded = decode(amf_bytes).unwrap();
    let object = decoded.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert_eq!(object.get("x"), Some(&Amf3Value::Integer(1)));

    assert_eq!(
        encode(&decoded),
        Err(EncodingError::DuplicateMember {
            class_name: "P".to_string(),
            member: "x".to_string()
        })
    );
}
