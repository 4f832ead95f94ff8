//! Dialect Tests
//!
//! Dialect selection for self-discriminated bases, annotated fields and
//! annotated unions, plus precedence and propagation rules.

use crate::*;
use shapeshift::CodecError;

// =============================================================================
// CONFIG-BASED VARIANT SUBTYPES
// =============================================================================

#[test]
fn test_config_based_variant_subtypes() {
    let m = Model::new();
    let expected = m.payload(m.variant1_subtype1);

    assert_eq!(m.codec.from_raw(m.variant1, &iso_raw(1), None).unwrap(), expected);
    assert_eq!(m.codec.from_json(m.variant1, &iso_json(1), None).unwrap(), expected);
    assert_eq!(
        m.codec
            .from_raw(m.variant1, &ordinal_raw(1), Some(&m.my_dialect))
            .unwrap(),
        expected
    );
    assert_eq!(
        m.codec
            .from_json(m.variant1, &ordinal_json(1), Some(&m.my_dialect))
            .unwrap(),
        expected
    );
}

#[test]
fn test_config_based_subtype_defined_after_first_use() {
    let m = Model::new();
    m.codec.from_raw(m.variant1, &iso_raw(1), None).unwrap();
    m.codec
        .from_raw(m.variant1, &ordinal_raw(1), Some(&m.my_dialect))
        .unwrap();

    let subtype2 = m.add_subtype("Variant1Subtype2", m.variant1, 2);
    let expected = m.payload(subtype2);

    assert_eq!(m.codec.from_raw(m.variant1, &iso_raw(2), None).unwrap(), expected);
    assert_eq!(m.codec.from_json(m.variant1, &iso_json(2), None).unwrap(), expected);
    assert_eq!(
        m.codec
            .from_raw(m.variant1, &ordinal_raw(2), Some(&m.my_dialect))
            .unwrap(),
        expected
    );
    assert_eq!(
        m.codec
            .from_json(m.variant1, &ordinal_json(2), Some(&m.my_dialect))
            .unwrap(),
        expected
    );
}

// =============================================================================
// ANNOTATION-BASED VARIANT SUBTYPES
// =============================================================================

#[test]
fn test_annotation_based_variant_subtypes() {
    let m = Model::new();
    let expected = m.wrapped(m.variant2_wrapper, m.payload(m.variant2_subtype1));

    assert_eq!(
        m.codec
            .from_raw(m.variant2_wrapper, &wrap_raw(iso_raw(1)), None)
            .unwrap(),
        expected
    );
    assert_eq!(
        m.codec
            .from_json(m.variant2_wrapper, &wrap_json(&iso_json(1)), None)
            .unwrap(),
        expected
    );
    assert_eq!(
        m.codec
            .from_raw(m.variant2_wrapper, &wrap_raw(ordinal_raw(1)), Some(&m.my_dialect))
            .unwrap(),
        expected
    );
    assert_eq!(
        m.codec
            .from_json(
                m.variant2_wrapper,
                &wrap_json(&ordinal_json(1)),
                Some(&m.my_dialect)
            )
            .unwrap(),
        expected
    );
}

#[test]
fn test_annotation_based_subtype_defined_after_first_use() {
    let m = Model::new();
    m.codec
        .from_raw(m.variant2_wrapper, &wrap_raw(iso_raw(1)), None)
        .unwrap();

    let subtype2 = m.add_subtype("Variant2Subtype2", m.variant2, 2);
    let expected = m.wrapped(m.variant2_wrapper, m.payload(subtype2));

    assert_eq!(
        m.codec
            .from_raw(m.variant2_wrapper, &wrap_raw(iso_raw(2)), None)
            .unwrap(),
        expected
    );
    assert_eq!(
        m.codec
            .from_json(m.variant2_wrapper, &wrap_json(&iso_json(2)), None)
            .unwrap(),
        expected
    );
    assert_eq!(
        m.codec
            .from_raw(m.variant2_wrapper, &wrap_raw(ordinal_raw(2)), Some(&m.my_dialect))
            .unwrap(),
        expected
    );
    assert_eq!(
        m.codec
            .from_json(
                m.variant2_wrapper,
                &wrap_json(&ordinal_json(2)),
                Some(&m.my_dialect)
            )
            .unwrap(),
        expected
    );
}

// =============================================================================
// ANNOTATION-BASED UNION SUBTYPES
// =============================================================================

#[test]
fn test_annotation_based_union_subtypes() {
    let m = Model::new();

    for (tag, concrete) in [(3, m.variant3_subtype), (4, m.variant4_subtype)] {
        let expected = m.wrapped(m.variant34_wrapper, m.payload(concrete));

        assert_eq!(
            m.codec
                .from_raw(m.variant34_wrapper, &wrap_raw(iso_raw(tag)), None)
                .unwrap(),
            expected,
            "iso raw, tag {}",
            tag
        );
        assert_eq!(
            m.codec
                .from_json(m.variant34_wrapper, &wrap_json(&iso_json(tag)), None)
                .unwrap(),
            expected,
            "iso json, tag {}",
            tag
        );
        assert_eq!(
            m.codec
                .from_raw(
                    m.variant34_wrapper,
                    &wrap_raw(ordinal_raw(tag)),
                    Some(&m.my_dialect)
                )
                .unwrap(),
            expected,
            "ordinal raw, tag {}",
            tag
        );
        assert_eq!(
            m.codec
                .from_json(
                    m.variant34_wrapper,
                    &wrap_json(&ordinal_json(tag)),
                    Some(&m.my_dialect)
                )
                .unwrap(),
            expected,
            "ordinal json, tag {}",
            tag
        );
    }
}

#[test]
fn test_annotation_based_union_subtypes_defined_after_first_use() {
    let m = Model::new();
    m.codec
        .from_raw(m.variant34_wrapper, &wrap_raw(iso_raw(3)), None)
        .unwrap();

    let variant3_subtype2 = m.add_subtype("Variant3Subtype2", m.variant3, 5);
    let variant4_subtype2 = m.add_subtype("Variant4Subtype2", m.variant4, 6);

    for (tag, concrete) in [(5, variant3_subtype2), (6, variant4_subtype2)] {
        let expected = m.wrapped(m.variant34_wrapper, m.payload(concrete));

        assert_eq!(
            m.codec
                .from_raw(m.variant34_wrapper, &wrap_raw(iso_raw(tag)), None)
                .unwrap(),
            expected
        );
        assert_eq!(
            m.codec
                .from_json(m.variant34_wrapper, &wrap_json(&iso_json(tag)), None)
                .unwrap(),
            expected
        );
        assert_eq!(
            m.codec
                .from_raw(
                    m.variant34_wrapper,
                    &wrap_raw(ordinal_raw(tag)),
                    Some(&m.my_dialect)
                )
                .unwrap(),
            expected
        );
        assert_eq!(
            m.codec
                .from_json(
                    m.variant34_wrapper,
                    &wrap_json(&ordinal_json(tag)),
                    Some(&m.my_dialect)
                )
                .unwrap(),
            expected
        );
    }
}

// =============================================================================
// PRECEDENCE
// =============================================================================

fn compact_dialect() -> Arc<Dialect> {
    Dialect::builder("compact")
        .strategy(
            TypeKey::Date,
            Strategy::new().encode(|data| {
                data.as_date()
                    .map(|d| Value::from(d.format("%Y%m%d").to_string()))
                    .ok_or_else(|| StrategyError::new("expected date"))
            }),
        )
        .build()
}

#[test]
fn test_precedence_yields_three_values() {
    init_tracing();
    let codec = Shapeshift::new();
    let plain = codec
        .define(RecordDef::new("Plain").field("x", SemType::Date))
        .unwrap();
    let dated = codec
        .define(
            RecordDef::new("Dated")
                .field("x", SemType::Date)
                .dialect(my_dialect())
                .allow_call_site_dialect(),
        )
        .unwrap();

    let plain_record = codec
        .instantiate(plain, [("x", Data::Date(sample_date()))])
        .unwrap();
    let dated_record = codec
        .instantiate(dated, [("x", Data::Date(sample_date()))])
        .unwrap();

    let builtin = codec.to_raw(&plain_record, None).unwrap();
    let type_default = codec.to_raw(&dated_record, None).unwrap();
    let call_site = codec
        .to_raw(&dated_record, Some(&compact_dialect()))
        .unwrap();

    assert_eq!(builtin.get("x"), Some(&Value::from("2023-06-03")));
    assert_eq!(type_default.get("x"), Some(&Value::Int(738674)));
    assert_eq!(call_site.get("x"), Some(&Value::from("20230603")));
}

#[test]
fn test_call_site_falls_through_to_builtin_for_unset_direction() {
    init_tracing();
    let codec = Shapeshift::new();
    let dated = codec
        .define(
            RecordDef::new("Dated")
                .field("x", SemType::Date)
                .dialect(my_dialect())
                .allow_call_site_dialect(),
        )
        .unwrap();

    // compact only encodes; decode under it uses the built-in, not MyDialect
    let record = codec
        .from_raw(
            dated,
            &Value::object([("x", Value::from("2023-06-03"))]),
            Some(&compact_dialect()),
        )
        .unwrap();
    assert_eq!(record.get("x"), Some(&Data::Date(sample_date())));
}

fn recase_dialect(name: &str, upper: bool) -> Arc<Dialect> {
    Dialect::builder(name)
        .strategy(
            TypeKey::Str,
            Strategy::new().decode(move |raw| {
                let text = raw
                    .as_str()
                    .ok_or_else(|| StrategyError::new("expected string"))?;
                Ok(Data::from(if upper {
                    text.to_uppercase()
                } else {
                    text.to_lowercase()
                }))
            }),
        )
        .build()
}

#[test]
fn test_precedence_on_decode() {
    init_tracing();
    let codec = Shapeshift::new();
    let plain = codec
        .define(RecordDef::new("PlainLabel").field("label", SemType::Str))
        .unwrap();
    let shouting = codec
        .define(
            RecordDef::new("ShoutingLabel")
                .field("label", SemType::Str)
                .dialect(recase_dialect("upper", true))
                .allow_call_site_dialect(),
        )
        .unwrap();
    let raw = Value::object([("label", Value::from("MiXeD"))]);

    let none = codec.from_raw(plain, &raw, None).unwrap();
    let type_default = codec.from_raw(shouting, &raw, None).unwrap();
    let call_site = codec
        .from_raw(shouting, &raw, Some(&recase_dialect("lower", false)))
        .unwrap();

    assert_eq!(none.get("label"), Some(&Data::from("MiXeD")));
    assert_eq!(type_default.get("label"), Some(&Data::from("MIXED")));
    assert_eq!(call_site.get("label"), Some(&Data::from("mixed")));
}

#[test]
fn test_dialect_beats_record_override() {
    init_tracing();
    let codec = Shapeshift::new();
    let pinned = codec
        .define(
            RecordDef::new("Pinned")
                .field("x", SemType::Date)
                .strategy(TypeKey::Date, Strategy::new().encode(|_| Ok(Value::from("pinned"))))
                .allow_call_site_dialect(),
        )
        .unwrap();

    let record = codec
        .instantiate(pinned, [("x", Data::Date(sample_date()))])
        .unwrap();
    let own = codec.to_raw(&record, None).unwrap();
    assert_eq!(own.get("x"), Some(&Value::from("pinned")));

    let with_dialect = codec.to_raw(&record, Some(&my_dialect())).unwrap();
    assert_eq!(with_dialect.get("x"), Some(&Value::Int(738674)));

    // A dialect with nothing for the key falls through to the record
    let decode_only = recase_dialect("decode-only", true);
    let fallthrough = codec.to_raw(&record, Some(&decode_only)).unwrap();
    assert_eq!(fallthrough.get("x"), Some(&Value::from("pinned")));
}

#[test]
fn test_call_site_rejected_without_support() {
    init_tracing();
    let codec = Shapeshift::new();
    let closed = codec
        .define(
            RecordDef::new("Closed")
                .field("x", SemType::Date)
                .dialect(default_dialect()),
        )
        .unwrap();

    let err = codec
        .from_raw(
            closed,
            &Value::object([("x", Value::Int(738674))]),
            Some(&my_dialect()),
        )
        .unwrap_err();
    assert_eq!(err.code(), "DialectNotSupported");
    assert_eq!(
        err.as_codec(),
        Some(&CodecError::DialectNotSupported {
            record: "Closed".to_string(),
            dialect: "MyDialect".to_string(),
        })
    );
}

// =============================================================================
// PROPAGATION
// =============================================================================

#[test]
fn test_nested_type_without_support_keeps_its_own_dialect() {
    init_tracing();
    let codec = Shapeshift::new();
    let inner = codec
        .define(
            RecordDef::new("Inner")
                .field("x", SemType::Date)
                .dialect(default_dialect()),
        )
        .unwrap();
    let outer = codec
        .define(
            RecordDef::new("Outer")
                .field("x", SemType::Date)
                .field("inner", SemType::Record(inner))
                .allow_call_site_dialect(),
        )
        .unwrap();

    let raw = Value::object([
        ("x", Value::Int(738674)),
        ("inner", Value::object([("x", Value::from("2023-06-03"))])),
    ]);
    let record = codec.from_raw(outer, &raw, Some(&my_dialect())).unwrap();

    assert_eq!(record.get("x"), Some(&Data::Date(sample_date())));
    let nested = record.get("inner").and_then(Data::as_record).unwrap();
    assert_eq!(nested.get("x"), Some(&Data::Date(sample_date())));

    assert_eq!(codec.to_raw(&record, Some(&my_dialect())).unwrap(), raw);
}

#[test]
fn test_call_site_dialect_reaches_dispatched_subtype_on_encode() {
    let m = Model::new();
    let record = m.wrapped(m.variant2_wrapper, m.payload(m.variant2_subtype1));

    assert_eq!(
        m.codec.to_raw(&record, None).unwrap(),
        wrap_raw(iso_raw(1))
    );
    assert_eq!(
        m.codec.to_raw(&record, Some(&m.my_dialect)).unwrap(),
        wrap_raw(ordinal_raw(1))
    );
}

#[test]
fn test_effective_dialect_is_part_of_cache_key() {
    let m = Model::new();
    m.codec.from_raw(m.variant1, &iso_raw(1), None).unwrap();
    m.codec
        .from_raw(m.variant1, &ordinal_raw(1), Some(&m.my_dialect))
        .unwrap();

    // The default dialect is never confused with MyDialect for the same type
    let err = m
        .codec
        .from_raw(m.variant1, &ordinal_raw(1), None)
        .unwrap_err();
    assert_eq!(err.code(), "StrategyFailed");
    assert_eq!(err.as_codec().and_then(CodecError::path), Some("$.x"));
}
