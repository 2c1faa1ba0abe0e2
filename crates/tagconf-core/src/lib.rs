//! Tag-driven record filling for tagconf.
//!
//! This crate holds the engine behind `tagconf`:
//! - Lazy source values over parsed YAML and JSON documents
//! - Per-field descriptors produced by `#[derive(Record)]`
//! - A small validation language (`required`, `>0`, `<=10`, `len=3`)
//! - A thread-safe cache of compiled validators
//! - A filler that applies defaults, checks required fields, recurses into
//!   nested records and collects every error it finds
//!
//! # Overview
//!
//! A record declares, per field, the source key for each document format,
//! an optional validation tag and an optional default literal. The
//! [`Decoder`] resolves every field against a [`SourceMap`]:
//!
//! 1. Fields with no key for the decoder's tag name are skipped.
//! 2. Absent keys take the default literal, fail if `required`, recurse into
//!    nested records with an empty map, or leave the field untouched.
//! 3. Present keys are decoded into the field and validated.
//!
//! All failures are returned together as [`DecodeErrors`].
//!
//! # Validation Tags
//!
//! ```text
//! required        the key must be present or have a default
//! >0  >=1  <10    range checks on numeric fields
//! <=0.5  =3
//! len=3  len<=8   length checks on strings, sequences and maps
//! ```
//!
//! Rules are comma separated and all of them are checked.

#![warn(missing_docs)]

mod cache;
mod decoder;
mod error;
mod lazy;
mod record;
mod tag;
mod validate;
mod value;

pub use cache::ValidatorCache;
pub use decoder::{decode, Decoder, DecoderBuilder, DEFAULT_TAG};
pub use error::{BoxError, DecodeError, DecodeErrors, DecodeResult, Measure, ValidationError};
pub use lazy::{JsonValue, LazyValue, SourceMap, YamlValue};
pub use record::{
    ErasedRecord, Element, Field, FieldDescriptor, FieldMut, FieldShape, Record, RecordSeq,
    ValueSlot, ANY_KEY_TAG,
};
pub use tag::{parse_rule, source_key, split_rules, Operator, Rule, RuleFamily};
pub use validate::{
    len_validator, range_validator, CompiledRules, Numeric, Validator, ValidatorFactory,
    ValidatorRegistry,
};
pub use value::{FieldValue, Inspect, ValueKind};
