//! Property and concurrency tests for the record filler.
//!
//! Records here are declared with `#[derive(Record)]` and decoded from JSON
//! source maps built in the test.

use std::sync::Arc;

use proptest::prelude::*;
use serde_json::json;
use tagconf_core::{Decoder, DecodeError, JsonValue, SourceMap, ValidatorCache};
use tagconf_macros::Record;

#[derive(Debug, Default, Clone, PartialEq, Record)]
#[config(crate = "tagconf_core")]
struct Limits {
    #[config(json = "small")]
    small: i8,
    #[config(json = "wide")]
    wide: u64,
    #[config(json = "signed")]
    signed: i64,
    #[config(json = "ratio")]
    ratio: f64,
    #[config(json = "label")]
    label: String,
    #[config(json = "enabled")]
    enabled: bool,
    #[config(json = "items")]
    items: Vec<u16>,
}

#[derive(Debug, Default, Record)]
#[config(crate = "tagconf_core")]
struct Bounded {
    #[config(json = "offset", validate = ">-10")]
    offset: i32,
}

#[derive(Debug, Default, Record)]
#[config(crate = "tagconf_core")]
struct WithDefault {
    #[config(json = "port", default = "8080", validate = "required")]
    port: u16,
    #[config(json = "host")]
    host: String,
}

#[derive(Debug, Default, Record)]
#[config(crate = "tagconf_core")]
struct Member {
    #[config(json = "id", validate = "required,>0")]
    id: u32,
}

#[derive(Debug, Default, Record)]
#[config(crate = "tagconf_core")]
struct Team {
    #[config(json = "members")]
    members: Vec<Member>,
}

fn source(value: serde_json::Value) -> SourceMap<JsonValue> {
    JsonValue::source_map(value).unwrap()
}

fn decoder() -> Decoder {
    Decoder::builder()
        .tag_name("json")
        .cache(Arc::new(ValidatorCache::new()))
        .build()
}

proptest! {
    #[test]
    fn present_scalars_round_trip(
        small in any::<i8>(),
        wide in any::<u64>(),
        signed in any::<i64>(),
        ratio in -1.0e6f64..1.0e6,
        label in "[a-zA-Z0-9 ]{0,16}",
        enabled in any::<bool>(),
        items in prop::collection::vec(any::<u16>(), 0..8),
    ) {
        let expected = Limits {
            small,
            wide,
            signed,
            ratio,
            label: label.clone(),
            enabled,
            items: items.clone(),
        };
        let map = source(json!({
            "small": small,
            "wide": wide,
            "signed": signed,
            "ratio": ratio,
            "label": label,
            "enabled": enabled,
            "items": items,
        }));

        let mut decoded = Limits::default();
        decoder().decode(&mut decoded, &map).unwrap();
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn absent_fields_keep_presets(small in any::<i8>(), label in ".{0,12}") {
        let mut decoded = Limits {
            small,
            label: label.clone(),
            ..Limits::default()
        };

        decoder().decode(&mut decoded, &source(json!({}))).unwrap();
        prop_assert_eq!(decoded.small, small);
        prop_assert_eq!(decoded.label, label);
    }

    #[test]
    fn lower_bound_matches_comparison(offset in any::<i32>()) {
        let mut decoded = Bounded::default();
        let result = decoder().decode(&mut decoded, &source(json!({"offset": offset})));

        prop_assert_eq!(result.is_ok(), offset > -10);
        prop_assert_eq!(decoded.offset, offset);
    }

    #[test]
    fn present_value_beats_default(port in any::<u16>()) {
        let mut decoded = WithDefault::default();
        decoder().decode(&mut decoded, &source(json!({"port": port}))).unwrap();
        prop_assert_eq!(decoded.port, port);
    }

    #[test]
    fn failing_elements_are_indexed(ids in prop::collection::vec(0u32..3, 1..6)) {
        let members: Vec<_> = ids.iter().map(|id| json!({"id": id})).collect();
        let mut team = Team::default();

        let result = decoder().decode(&mut team, &source(json!({"members": members})));

        let failing: Vec<usize> = ids
            .iter()
            .enumerate()
            .filter(|(_, id)| **id == 0)
            .map(|(index, _)| index)
            .collect();
        let reported: Vec<usize> = match result {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .iter()
                .map(|err| match err {
                    DecodeError::Element { index, .. } => *index,
                    other => panic!("unexpected error: {other}"),
                })
                .collect(),
        };

        prop_assert_eq!(reported, failing);
        prop_assert_eq!(team.members.len(), ids.len());
    }
}

#[test]
fn test_default_applies_when_absent_even_if_required() {
    let mut decoded = WithDefault::default();
    decoder()
        .decode(&mut decoded, &source(json!({"host": "localhost"})))
        .unwrap();

    assert_eq!(decoded.port, 8080);
    assert_eq!(decoded.host, "localhost");
}

#[test]
fn test_concurrent_decodes_share_cache() {
    let decoder = decoder();
    let inputs: Vec<i32> = (-20..20).collect();

    let concurrent: Vec<bool> = std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|offset| {
                let decoder = &decoder;
                scope.spawn(move || {
                    let mut decoded = Bounded::default();
                    decoder
                        .decode(&mut decoded, &source(json!({"offset": offset})))
                        .is_ok()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let sequential: Vec<bool> = inputs
        .iter()
        .map(|offset| {
            let mut decoded = Bounded::default();
            decoder
                .decode(&mut decoded, &source(json!({"offset": offset})))
                .is_ok()
        })
        .collect();

    assert_eq!(concurrent, sequential);
    assert_eq!(decoder.cache().len(), 1);
}
