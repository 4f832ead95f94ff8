//! Round-Trip Property Tests
//!
//! Encoding under a dialect and decoding under the same dialect gives back
//! the original record, through the base and through the wrappers.

use crate::*;
use proptest::prelude::*;
use proptest::strategy::Strategy as _;

fn date() -> impl proptest::strategy::Strategy<Value = NaiveDate> {
    (1i32..=9999, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).expect("valid date"))
}

fn dict() -> impl proptest::strategy::Strategy<Value = Data> {
    prop::collection::btree_map("[a-z0-9]{1,6}", any::<i64>(), 0..6).prop_map(|map| {
        Data::dict(map.into_iter().map(|(k, v)| (k, Data::Int(v))))
    })
}

fn payload(m: &Model, ty: RecordTypeId, x: NaiveDate, y: Data) -> Record {
    m.codec
        .instantiate(ty, [("x", Data::Date(x)), ("y", y)])
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_base_round_trip_under_each_dialect(x in date(), y in dict(), use_mine in any::<bool>()) {
        let m = Model::new();
        let dialect = if use_mine { Some(&m.my_dialect) } else { None };
        let record = payload(&m, m.variant1_subtype1, x, y);

        let raw = m.codec.to_raw_as(m.variant1, &record, dialect).unwrap();
        prop_assert_eq!(m.codec.from_raw(m.variant1, &raw, dialect).unwrap(), record.clone());

        let text = m.codec.to_json(&record, dialect).unwrap();
        prop_assert_eq!(m.codec.from_json(m.variant1, &text, dialect).unwrap(), record);
    }

    #[test]
    fn prop_union_wrapper_round_trip(x in date(), y in dict(), third in any::<bool>(), use_mine in any::<bool>()) {
        let m = Model::new();
        let dialect = if use_mine { Some(&m.my_dialect) } else { None };
        let concrete = if third { m.variant3_subtype } else { m.variant4_subtype };
        let record = m.wrapped(m.variant34_wrapper, payload(&m, concrete, x, y));

        let text = m.codec.to_json(&record, dialect).unwrap();
        prop_assert_eq!(m.codec.from_json(m.variant34_wrapper, &text, dialect).unwrap(), record);
    }

    #[test]
    fn prop_dialects_disagree_on_dates(x in date()) {
        let m = Model::new();
        let record = payload(&m, m.variant1_subtype1, x, sample_dict());

        let iso = m.codec.to_raw(&record, None).unwrap();
        let ordinal = m.codec.to_raw(&record, Some(&m.my_dialect)).unwrap();
        prop_assert_eq!(iso.get("x"), Some(&Value::from(x.to_string())));
        prop_assert_eq!(ordinal.get("x"), Some(&Value::Int(i64::from(x.num_days_from_ce()))));
    }
}
