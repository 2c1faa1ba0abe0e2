//! The record filler.
//!
//! [`Decoder::decode`] walks a record's field descriptors, resolves every
//! field from a [`SourceMap`], applies defaults and `required` checks,
//! recurses into nested records and record sequences, and runs the compiled
//! validators. Failures are collected rather than returned early, so one
//! call reports every problem in the document.

use std::sync::Arc;

use crate::cache::ValidatorCache;
use crate::error::{DecodeError, DecodeErrors, DecodeResult};
use crate::lazy::{LazyValue, SourceMap};
use crate::record::{ErasedRecord, FieldDescriptor, FieldMut, Record, RecordSeq};
use crate::validate::{CompiledRules, ValidatorRegistry};

/// Tag name used when none is configured.
pub const DEFAULT_TAG: &str = "yaml";

/// Where the values being filled come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    /// The caller's document; validators run.
    Source,
    /// A default literal; validators and `required` checks are skipped.
    Defaults,
}

impl Pass {
    fn validates(self) -> bool {
        self == Self::Source
    }
}

/// Fills records from source maps.
///
/// A decoder is cheap to clone and safe to share between threads; clones
/// share the same [`ValidatorCache`].
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tagconf_core::{Decoder, JsonValue};
/// # use tagconf_core::{Field, FieldDescriptor, FieldMut, LazyValue, Record};
/// # #[derive(Default)]
/// # struct Server { port: u16 }
/// # impl Record for Server {
/// #     const NAME: &'static str = "Server";
/// #     fn descriptors() -> &'static [FieldDescriptor] {
/// #         static FIELDS: &[FieldDescriptor] = &[FieldDescriptor::new::<u16>("port", "u16")
/// #             .with_keys(&[("json", "port")])
/// #             .with_validate("required,>0")];
/// #         FIELDS
/// #     }
/// #     fn field_mut<L: LazyValue>(&mut self, index: usize) -> Option<FieldMut<'_, L>> {
/// #         match index {
/// #             0 => Some(Field::as_field_mut(&mut self.port)),
/// #             _ => None,
/// #         }
/// #     }
/// # }
///
/// let source = JsonValue::source_map(json!({"port": 8080})).unwrap();
/// let mut server = Server::default();
///
/// Decoder::new("json").decode(&mut server, &source).unwrap();
/// assert_eq!(server.port, 8080);
/// ```
#[derive(Debug, Clone)]
pub struct Decoder {
    tag_name: String,
    cache: Arc<ValidatorCache>,
}

impl Decoder {
    /// Creates a decoder for `tag_name` sharing the global cache.
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self::builder().tag_name(tag_name).build()
    }

    /// Starts building a decoder.
    pub fn builder() -> DecoderBuilder {
        DecoderBuilder::default()
    }

    /// The tag name that selects source keys.
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// The cache of compiled rules.
    pub fn cache(&self) -> &Arc<ValidatorCache> {
        &self.cache
    }

    /// Fills `record` from `source`.
    ///
    /// The record may be partially populated when an error is returned.
    pub fn decode<R: Record, L: LazyValue>(
        &self,
        record: &mut R,
        source: &SourceMap<L>,
    ) -> DecodeResult<()> {
        let mut errors = DecodeErrors::new();
        self.fill(record, source, Pass::Source, &mut errors);

        tracing::debug!(
            record = R::NAME,
            tag = %self.tag_name,
            keys = source.len(),
            errors = errors.len(),
            "decode finished"
        );
        errors.into_result()
    }

    fn fill<L: LazyValue>(
        &self,
        record: &mut dyn ErasedRecord<L>,
        source: &SourceMap<L>,
        pass: Pass,
        errors: &mut DecodeErrors,
    ) {
        for (index, desc) in record.descriptors().iter().enumerate() {
            let key = desc.source_key(&self.tag_name);
            if key.is_empty() {
                tracing::trace!(field = desc.name, tag = %self.tag_name, "field not bound, skipping");
                continue;
            }

            let compiled =
                self.cache
                    .get_or_compile(record.record_type(), record.record_name(), desc);
            let rules = match compiled {
                Ok(rules) => rules,
                Err(err) => {
                    errors.push(err);
                    continue;
                }
            };

            let Some(slot) = record.field_mut(index) else {
                continue;
            };

            match source.get(key).filter(|value| !value.is_null()) {
                Some(value) => {
                    tracing::trace!(field = desc.name, key, found = value.type_name(), "field present");
                    self.fill_present(desc, key, &rules, slot, value, pass, errors);
                }
                None => {
                    tracing::trace!(field = desc.name, key, "field absent");
                    self.fill_absent(desc, key, &rules, slot, pass, errors);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn fill_present<L: LazyValue>(
        &self,
        desc: &FieldDescriptor,
        key: &str,
        rules: &CompiledRules,
        slot: FieldMut<'_, L>,
        value: &L,
        pass: Pass,
        errors: &mut DecodeErrors,
    ) {
        match slot {
            FieldMut::Record(nested) => match value.decode_map() {
                Some(map) => self.fill(nested, &map, pass, errors),
                None => errors.push(DecodeError::shape_mismatch(
                    desc.name,
                    desc.type_name,
                    "mapping",
                    value.type_name(),
                    field_names(nested.descriptors()),
                )),
            },
            FieldMut::RecordSeq(seq) => match value.decode_seq() {
                Some(items) => {
                    self.fill_seq(desc, seq, &items, pass, errors);
                    if pass.validates() {
                        for err in rules.check(seq.inspect()) {
                            errors.push(err);
                        }
                    }
                }
                None => errors.push(DecodeError::shape_mismatch(
                    desc.name,
                    desc.type_name,
                    "sequence",
                    value.type_name(),
                    field_names(seq.element_descriptors()),
                )),
            },
            FieldMut::Value(storage) => match storage.decode_from(value) {
                Ok(()) => {
                    if pass.validates() {
                        for err in rules.check(storage.inspect()) {
                            errors.push(err);
                        }
                    }
                }
                Err(err) => errors.push(DecodeError::decode(desc.name, key, err)),
            },
        }
    }

    fn fill_absent<L: LazyValue>(
        &self,
        desc: &FieldDescriptor,
        key: &str,
        rules: &CompiledRules,
        slot: FieldMut<'_, L>,
        pass: Pass,
        errors: &mut DecodeErrors,
    ) {
        // An empty default literal declares no default.
        if let Some(literal) = desc.default.filter(|literal| !literal.is_empty()) {
            self.apply_default(desc, literal, slot, errors);
        } else if rules.is_required() && pass.validates() {
            errors.push(DecodeError::missing_required(key, desc.type_name));
        } else if let FieldMut::Record(nested) = slot {
            // Nested defaults still apply under an absent parent.
            self.fill(nested, &SourceMap::new(), pass, errors);
        }
    }

    fn apply_default<L: LazyValue>(
        &self,
        desc: &FieldDescriptor,
        literal: &str,
        slot: FieldMut<'_, L>,
        errors: &mut DecodeErrors,
    ) {
        tracing::trace!(field = desc.name, literal, "applying default");
        match slot {
            FieldMut::Value(storage) => {
                if let Err(err) = storage.set_literal(literal) {
                    errors.push(DecodeError::invalid_literal(desc.name, literal, err));
                }
            }
            FieldMut::Record(nested) => {
                match L::from_literal(literal).map(|node| node.decode_map()) {
                    Ok(Some(map)) => {
                        nested.reset();
                        self.fill(nested, &map, Pass::Defaults, errors);
                    }
                    Ok(None) => errors.push(DecodeError::invalid_literal(
                        desc.name,
                        literal,
                        "expected a mapping",
                    )),
                    Err(err) => errors.push(DecodeError::invalid_literal(desc.name, literal, err)),
                }
            }
            FieldMut::RecordSeq(seq) => {
                match L::from_literal(literal).map(|node| node.decode_seq()) {
                    Ok(Some(items)) => self.fill_seq(desc, seq, &items, Pass::Defaults, errors),
                    Ok(None) => errors.push(DecodeError::invalid_literal(
                        desc.name,
                        literal,
                        "expected a sequence",
                    )),
                    Err(err) => errors.push(DecodeError::invalid_literal(desc.name, literal, err)),
                }
            }
        }
    }

    fn fill_seq<L: LazyValue>(
        &self,
        desc: &FieldDescriptor,
        seq: &mut dyn RecordSeq<L>,
        items: &[L],
        pass: Pass,
        errors: &mut DecodeErrors,
    ) {
        let element_fields = seq.element_descriptors();
        seq.reset(items.len());

        for (index, item) in items.iter().enumerate() {
            let Some(map) = item.decode_map() else {
                errors.push(DecodeError::element(
                    desc.name,
                    index,
                    DecodeError::shape_mismatch(
                        desc.name,
                        desc.type_name,
                        "mapping",
                        item.type_name(),
                        field_names(element_fields),
                    ),
                ));
                continue;
            };
            let Some(element) = seq.element_mut(index) else {
                continue;
            };

            let mut nested = DecodeErrors::new();
            self.fill(element, &map, pass, &mut nested);
            for err in nested {
                errors.push(DecodeError::element(desc.name, index, err));
            }
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::builder().build()
    }
}

fn field_names(fields: &'static [FieldDescriptor]) -> Vec<&'static str> {
    fields.iter().map(|field| field.name).collect()
}

/// Builder for [`Decoder`].
#[derive(Debug, Default)]
pub struct DecoderBuilder {
    tag_name: Option<String>,
    cache: Option<Arc<ValidatorCache>>,
}

impl DecoderBuilder {
    /// Sets the tag name that selects source keys (default `yaml`).
    pub fn tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = Some(tag_name.into());
        self
    }

    /// Uses an explicit cache instead of the global one.
    pub fn cache(mut self, cache: Arc<ValidatorCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Uses a private cache over a custom registry.
    pub fn registry(self, registry: ValidatorRegistry) -> Self {
        self.cache(Arc::new(ValidatorCache::with_registry(registry)))
    }

    /// Builds the decoder.
    pub fn build(self) -> Decoder {
        Decoder {
            tag_name: self.tag_name.unwrap_or_else(|| DEFAULT_TAG.to_owned()),
            cache: self
                .cache
                .unwrap_or_else(|| Arc::clone(ValidatorCache::global())),
        }
    }
}

/// Fills `record` from `source` with the global cache.
pub fn decode<R: Record, L: LazyValue>(
    record: &mut R,
    tag_name: &str,
    source: &SourceMap<L>,
) -> DecodeResult<()> {
    Decoder::new(tag_name).decode(record, source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lazy::{JsonValue, YamlValue};
    use serde_json::json;
    use tagconf_macros::Record;

    #[derive(Debug, Default, PartialEq, Record)]
    #[config(crate = "crate")]
    struct Address {
        #[config(json = "street", yaml = "street", validate = "required")]
        street: String,
        #[config(json = "city", yaml = "city", default = "Springfield")]
        city: String,
    }

    #[derive(Debug, Default, Record)]
    #[config(crate = "crate")]
    struct Person {
        #[config(json = "name", yaml = "name", validate = "required,len<=8")]
        name: String,
        #[config(json = "age", yaml = "age", validate = ">0,<150")]
        age: u32,
        #[config(json = "nickname", yaml = "nickname")]
        nickname: Option<String>,
        #[config(json = "address", yaml = "address")]
        address: Address,
        #[config(json = "friends", yaml = "friends", validate = "len<=2")]
        friends: Vec<Address>,
        #[config(yaml = "secret")]
        secret: String,
        untagged: u8,
    }

    fn json(value: serde_json::Value) -> SourceMap<JsonValue> {
        JsonValue::source_map(value).unwrap()
    }

    fn yaml(doc: &str) -> SourceMap<YamlValue> {
        YamlValue::source_map(serde_yaml::from_str(doc).unwrap()).unwrap()
    }

    fn decoder(tag: &str) -> Decoder {
        Decoder::builder()
            .tag_name(tag)
            .cache(Arc::new(ValidatorCache::new()))
            .build()
    }

    #[test]
    fn test_present_fields_are_decoded() {
        let mut person = Person::default();
        let source = json(json!({
            "name": "Ann",
            "age": 33,
            "nickname": "annie",
            "address": {"street": "Main", "city": "Shelbyville"},
            "friends": [{"street": "Elm"}],
        }));

        decoder("json").decode(&mut person, &source).unwrap();

        assert_eq!(person.name, "Ann");
        assert_eq!(person.age, 33);
        assert_eq!(person.nickname.as_deref(), Some("annie"));
        assert_eq!(person.address.city, "Shelbyville");
        assert_eq!(
            person.friends,
            vec![Address {
                street: "Elm".to_string(),
                city: "Springfield".to_string(),
            }]
        );
    }

    #[test]
    fn test_absent_optional_fields_keep_presets() {
        let mut person = Person {
            age: 40,
            nickname: Some("preset".to_string()),
            untagged: 7,
            ..Person::default()
        };
        let source = json(json!({"name": "Bob", "address": {"street": "Oak"}}));

        decoder("json").decode(&mut person, &source).unwrap();

        assert_eq!(person.age, 40);
        assert_eq!(person.nickname.as_deref(), Some("preset"));
        assert_eq!(person.untagged, 7);
    }

    #[test]
    fn test_missing_required_is_reported() {
        let mut person = Person::default();
        let source = json(json!({"age": 20, "address": {"street": "Oak"}}));

        let errors = decoder("json").decode(&mut person, &source).unwrap_err();

        assert_eq!(errors.len(), 1);
        let msg = errors.to_string();
        assert!(msg.contains("name"));
        assert!(msg.contains("String"));
        assert_eq!(person.age, 20);
    }

    #[test]
    fn test_absent_nested_record_gets_defaults_and_required_checks() {
        let mut person = Person::default();
        let source = json(json!({"name": "Cy"}));

        let errors = decoder("json").decode(&mut person, &source).unwrap_err();

        assert_eq!(person.address.city, "Springfield");
        assert!(matches!(
            errors.iter().next(),
            Some(DecodeError::MissingRequired { key, .. }) if key == "street"
        ));
    }

    #[test]
    fn test_shape_mismatch_keeps_siblings() {
        let mut person = Person::default();
        let source = json(json!({"name": "Di", "age": 30, "address": "Main Street"}));

        let errors = decoder("json").decode(&mut person, &source).unwrap_err();

        assert_eq!(errors.len(), 1);
        let msg = errors.to_string();
        assert!(msg.contains("string"));
        assert!(msg.contains("address"));
        assert!(msg.contains("street, city"));
        assert_eq!(person.age, 30);
    }

    #[test]
    fn test_sequence_elements_fail_independently() {
        let mut person = Person::default();
        let source = json(json!({
            "name": "Ed",
            "address": {"street": "Oak"},
            "friends": [{"city": "Ogdenville"}, {"street": "Pine"}],
        }));

        let errors = decoder("json").decode(&mut person, &source).unwrap_err();

        assert_eq!(errors.len(), 1);
        assert!(errors.to_string().starts_with("friends[0]: "));
        assert_eq!(person.friends.len(), 2);
        assert_eq!(person.friends[1].street, "Pine");
    }

    #[test]
    fn test_sequence_shape_mismatch() {
        let mut person = Person::default();
        let source = json(json!({
            "name": "Fay",
            "address": {"street": "Oak"},
            "friends": {"street": "Pine"},
        }));

        let errors = decoder("json").decode(&mut person, &source).unwrap_err();
        let msg = errors.to_string();
        assert!(msg.contains("sequence"));
        assert!(msg.contains("mapping"));
    }

    #[test]
    fn test_validators_are_aggregated() {
        let mut person = Person::default();
        let source = json(json!({
            "name": "Bartholomew",
            "age": 200,
            "address": {"street": "Oak"},
            "friends": [{"street": "a"}, {"street": "b"}, {"street": "c"}],
        }));

        let errors = decoder("json").decode(&mut person, &source).unwrap_err();

        assert_eq!(errors.len(), 3);
        let msg = errors.to_string();
        assert!(msg.contains("len 11"));
        assert!(msg.contains("200"));
        assert!(msg.contains("len 3"));
    }

    #[test]
    fn test_decode_error_is_reported_per_field() {
        let mut person = Person::default();
        let source = json(json!({"name": "Gus", "age": "old", "address": {"street": "Oak"}}));

        let errors = decoder("json").decode(&mut person, &source).unwrap_err();

        assert!(matches!(
            errors.iter().next(),
            Some(DecodeError::Decode { field, .. }) if field == "age"
        ));
        assert_eq!(person.name, "Gus");
    }

    #[test]
    fn test_null_counts_as_absent() {
        let mut person = Person {
            age: 9,
            ..Person::default()
        };
        let source = json(json!({"name": "Hal", "age": null, "address": {"street": "Oak"}}));

        decoder("json").decode(&mut person, &source).unwrap();
        assert_eq!(person.age, 9);
    }

    #[test]
    fn test_fields_unbound_for_tag_are_skipped() {
        let mut person = Person::default();
        let source = json(json!({"name": "Ike", "secret": "s3cr3t", "address": {"street": "Oak"}}));

        decoder("json").decode(&mut person, &source).unwrap();
        assert!(person.secret.is_empty());

        let mut person = Person::default();
        let source = yaml("name: Ike\nsecret: s3cr3t\naddress: {street: Oak}\n");
        decoder("yaml").decode(&mut person, &source).unwrap();
        assert_eq!(person.secret, "s3cr3t");
    }

    #[derive(Debug, Default, Record)]
    #[config(crate = "crate")]
    struct Defaults {
        #[config(key = "level", default = "3", validate = "required,<2")]
        level: u8,
        #[config(key = "home", default = "{street: Main, city: Capital}")]
        home: Address,
        #[config(key = "stops", default = "[{street: A}, {street: B}]")]
        stops: Vec<Address>,
        #[config(key = "ratio", default = "0.25")]
        ratio: f32,
        #[config(key = "broken", default = "not a number")]
        broken: i32,
    }

    #[test]
    fn test_defaults_apply_without_validation() {
        let mut record = Defaults::default();
        let source = yaml("{}");

        let errors = decoder("yaml").decode(&mut record, &source).unwrap_err();

        assert_eq!(record.level, 3);
        assert_eq!(record.home.street, "Main");
        assert_eq!(record.home.city, "Capital");
        assert_eq!(record.stops.len(), 2);
        assert_eq!(record.stops[1].city, "Springfield");
        assert!((record.ratio - 0.25).abs() < f32::EPSILON);

        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors.iter().next(),
            Some(DecodeError::InvalidLiteral { field, .. }) if field == "broken"
        ));
    }

    #[test]
    fn test_present_value_beats_default() {
        let mut record = Defaults::default();
        let source = yaml("level: 1\nbroken: 5\n");

        decoder("yaml").decode(&mut record, &source).unwrap();

        assert_eq!(record.level, 1);
        assert_eq!(record.broken, 5);
    }

    #[derive(Debug, Default, Record)]
    #[config(crate = "crate")]
    struct PartialDefaults {
        #[config(key = "home", default = "{city: Capital}")]
        home: Address,
        #[config(key = "label", default = "")]
        label: String,
    }

    #[test]
    fn test_record_default_replaces_preset() {
        let mut record = PartialDefaults {
            home: Address {
                street: "Preset".into(),
                city: "Old".into(),
            },
            label: String::new(),
        };

        decoder("yaml").decode(&mut record, &yaml("{}")).unwrap();

        assert_eq!(
            record.home,
            Address {
                street: String::new(),
                city: "Capital".into(),
            }
        );
    }

    #[test]
    fn test_empty_default_is_no_default() {
        let mut record = PartialDefaults {
            label: "kept".into(),
            ..PartialDefaults::default()
        };

        decoder("json").decode(&mut record, &json(json!({"home": {"street": "Elm"}}))).unwrap();

        assert_eq!(record.label, "kept");
        assert_eq!(record.home.city, "Springfield");
    }

    #[derive(Debug, Default, Record)]
    #[config(crate = "crate")]
    struct BadRules {
        #[config(key = "a", validate = "not_required")]
        a: u8,
        #[config(key = "b", validate = ">1")]
        b: u8,
    }

    #[test]
    fn test_invalid_rule_skips_only_that_field() {
        let mut record = BadRules::default();
        let source = json(json!({"a": 5, "b": 0}));

        let errors = decoder("json").decode(&mut record, &source).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert_eq!(record.a, 0);
        assert_eq!(record.b, 0);
        let msg = errors.to_string();
        assert!(msg.contains("not_required"));
        assert!(msg.contains("should be > 1"));
    }

    #[test]
    fn test_free_decode_uses_global_cache() {
        let mut record = BadRules::default();
        let source = json(json!({"b": 2}));

        let result = decode(&mut record, "key", &source);

        assert!(result.is_err());
        assert_eq!(record.b, 2);
        assert!(!ValidatorCache::global().is_empty());
    }

    #[test]
    fn test_builder_defaults() {
        let decoder = Decoder::default();
        assert_eq!(decoder.tag_name(), DEFAULT_TAG);
        assert!(Arc::ptr_eq(decoder.cache(), ValidatorCache::global()));
    }
}
