//! Field reflection for target records.
//!
//! A [`Record`] exposes a static table of [`FieldDescriptor`]s and a way to
//! borrow each field's storage as a [`FieldMut`]. Both are normally generated
//! by `#[derive(Record)]`, but the traits are plain Rust and can be
//! implemented by hand:
//!
//! ```
//! use tagconf_core::{Field, FieldDescriptor, FieldMut, LazyValue, Record};
//!
//! #[derive(Default)]
//! struct Server {
//!     port: u16,
//! }
//!
//! impl Record for Server {
//!     const NAME: &'static str = "Server";
//!
//!     fn descriptors() -> &'static [FieldDescriptor] {
//!         static FIELDS: &[FieldDescriptor] = &[FieldDescriptor::new::<u16>("port", "u16")
//!             .with_keys(&[("yaml", "port")])
//!             .with_validate(">0")];
//!         FIELDS
//!     }
//!
//!     fn field_mut<L: LazyValue>(&mut self, index: usize) -> Option<FieldMut<'_, L>> {
//!         match index {
//!             0 => Some(Field::as_field_mut(&mut self.port)),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use std::any::TypeId;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::{BuildHasher, Hash};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

use crate::lazy::LazyValue;
use crate::tag;
use crate::value::{FieldValue, Inspect, ValueKind};

/// Tag name used as a fallback source key for every primary tag.
pub const ANY_KEY_TAG: &str = "key";

/// Structural category of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldShape {
    /// Decoded directly from one node.
    Scalar,
    /// A nested record filled recursively.
    Record,
    /// A sequence of scalars, decoded directly.
    ScalarSeq,
    /// A sequence of records, each filled recursively.
    RecordSeq,
}

/// Static metadata of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Field name as declared on the record.
    pub name: &'static str,
    /// Declared type, as written.
    pub type_name: &'static str,
    /// `(tag name, tag value)` pairs binding source keys.
    pub keys: &'static [(&'static str, &'static str)],
    /// Validation tag.
    pub validate: Option<&'static str>,
    /// Default literal used when the key is absent.
    pub default: Option<&'static str>,
    /// Structural category.
    pub shape: FieldShape,
    /// Kind used to select validators.
    pub kind: ValueKind,
}

impl FieldDescriptor {
    /// Creates a descriptor for a field of type `T` with no tags.
    pub const fn new<T: Field>(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            type_name,
            keys: &[],
            validate: None,
            default: None,
            shape: T::SHAPE,
            kind: T::KIND,
        }
    }

    /// Sets the source key tags.
    pub const fn with_keys(mut self, keys: &'static [(&'static str, &'static str)]) -> Self {
        self.keys = keys;
        self
    }

    /// Sets the validation tag.
    pub const fn with_validate(mut self, validate: &'static str) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Sets the default literal.
    pub const fn with_default(mut self, default: &'static str) -> Self {
        self.default = Some(default);
        self
    }

    /// Returns the raw tag value for `tag_name`, if declared.
    pub fn tag(&self, tag_name: &str) -> Option<&'static str> {
        self.keys
            .iter()
            .find(|(name, _)| *name == tag_name)
            .map(|(_, value)| *value)
    }

    /// Returns the source key bound under `tag_name`.
    ///
    /// Falls back to the [`ANY_KEY_TAG`] tag; returns an empty string when the
    /// field is not bound for this tag name.
    pub fn source_key(&self, tag_name: &str) -> &'static str {
        self.tag(tag_name)
            .or_else(|| self.tag(ANY_KEY_TAG))
            .map(tag::source_key)
            .unwrap_or_default()
    }
}

/// Mutable handle to one field's storage.
pub enum FieldMut<'a, L: LazyValue> {
    /// Scalars and sequences of scalars.
    Value(&'a mut dyn ValueSlot<L>),
    /// A nested record.
    Record(&'a mut dyn ErasedRecord<L>),
    /// A sequence of records.
    RecordSeq(&'a mut dyn RecordSeq<L>),
}

/// Storage that a lazy value decodes into directly.
pub trait ValueSlot<L: LazyValue> {
    /// Replaces the stored value with the decoded node.
    fn decode_from(&mut self, value: &L) -> Result<(), L::Error>;

    /// Replaces the stored value with a relaxed YAML literal.
    fn set_literal(&mut self, literal: &str) -> Result<(), serde_yaml::Error>;

    /// Read-only view for validators.
    fn inspect(&self) -> &dyn Inspect;
}

impl<T: FieldValue, L: LazyValue> ValueSlot<L> for T {
    fn decode_from(&mut self, value: &L) -> Result<(), L::Error> {
        *self = value.decode::<T>()?;
        Ok(())
    }

    fn set_literal(&mut self, literal: &str) -> Result<(), serde_yaml::Error> {
        *self = serde_yaml::from_str(literal)?;
        Ok(())
    }

    fn inspect(&self) -> &dyn Inspect {
        self
    }
}

/// Storage for a sequence of records.
pub trait RecordSeq<L: LazyValue> {
    /// Descriptors of the element record.
    fn element_descriptors(&self) -> &'static [FieldDescriptor];

    /// Replaces the sequence with `len` freshly defaulted elements.
    fn reset(&mut self, len: usize);

    /// Borrows element `index`.
    fn element_mut(&mut self, index: usize) -> Option<&mut dyn ErasedRecord<L>>;

    /// Read-only view for validators.
    fn inspect(&self) -> &dyn Inspect;
}

impl<R: Record, L: LazyValue> RecordSeq<L> for Vec<R> {
    fn element_descriptors(&self) -> &'static [FieldDescriptor] {
        R::descriptors()
    }

    fn reset(&mut self, len: usize) {
        *self = std::iter::repeat_with(R::default).take(len).collect();
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn ErasedRecord<L>> {
        self.get_mut(index)
            .map(|element| element as &mut dyn ErasedRecord<L>)
    }

    fn inspect(&self) -> &dyn Inspect {
        self
    }
}

/// A record whose fields can be filled by name.
///
/// Records must be `Default` so that sequence elements can be allocated
/// before they are filled.
pub trait Record: Default + 'static {
    /// Type name used in log lines and messages.
    const NAME: &'static str;

    /// Field descriptors, in declaration order.
    fn descriptors() -> &'static [FieldDescriptor];

    /// Borrows the storage of the field at `index` in [`Record::descriptors`].
    fn field_mut<L: LazyValue>(&mut self, index: usize) -> Option<FieldMut<'_, L>>;
}

/// Object-safe view of a [`Record`], used while recursing.
pub trait ErasedRecord<L: LazyValue> {
    /// Field descriptors of the record type.
    fn descriptors(&self) -> &'static [FieldDescriptor];

    /// Identity of the record type.
    fn record_type(&self) -> TypeId;

    /// Name of the record type.
    fn record_name(&self) -> &'static str;

    /// Borrows the storage of field `index`.
    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_, L>>;

    /// Replaces the record with its `Default` value.
    fn reset(&mut self);
}

impl<R: Record, L: LazyValue> ErasedRecord<L> for R {
    fn descriptors(&self) -> &'static [FieldDescriptor] {
        R::descriptors()
    }

    fn record_type(&self) -> TypeId {
        TypeId::of::<R>()
    }

    fn record_name(&self) -> &'static str {
        R::NAME
    }

    fn field_mut(&mut self, index: usize) -> Option<FieldMut<'_, L>> {
        Record::field_mut(self, index)
    }

    fn reset(&mut self) {
        *self = R::default();
    }
}

/// A type that can appear as a record field.
pub trait Field {
    /// Structural category of the field.
    const SHAPE: FieldShape;
    /// Kind used to select validators.
    const KIND: ValueKind;

    /// Borrows the field's storage.
    fn as_field_mut<L: LazyValue>(&mut self) -> FieldMut<'_, L>;
}

/// A type that can appear as the element of a `Vec` field.
pub trait Element: Sized {
    /// Shape of a `Vec<Self>` field.
    const SEQ_SHAPE: FieldShape = FieldShape::ScalarSeq;

    /// Borrows a `Vec<Self>` field's storage.
    fn vec_field_mut<L: LazyValue>(vec: &mut Vec<Self>) -> FieldMut<'_, L>;
}

impl<T: Element + 'static> Field for Vec<T> {
    const SHAPE: FieldShape = T::SEQ_SHAPE;
    const KIND: ValueKind = ValueKind::Seq;

    fn as_field_mut<L: LazyValue>(&mut self) -> FieldMut<'_, L> {
        T::vec_field_mut(self)
    }
}

impl<T: FieldValue> Element for Vec<T> {
    fn vec_field_mut<L: LazyValue>(vec: &mut Vec<Self>) -> FieldMut<'_, L> {
        FieldMut::Value(vec)
    }
}

impl<T: FieldValue> Field for Option<T> {
    const SHAPE: FieldShape = FieldShape::Scalar;
    const KIND: ValueKind = T::KIND;

    fn as_field_mut<L: LazyValue>(&mut self) -> FieldMut<'_, L> {
        FieldMut::Value(self)
    }
}

impl<T: FieldValue> Element for Option<T> {
    fn vec_field_mut<L: LazyValue>(vec: &mut Vec<Self>) -> FieldMut<'_, L> {
        FieldMut::Value(vec)
    }
}

// Types that are already `FieldValue` and decode as one node.
macro_rules! impl_value_field {
    ($shape:ident, $ty:ty $(, [$($generics:tt)*] where $($bounds:tt)+)?) => {
        impl $(<$($generics)*>)? Field for $ty
        where
            $ty: FieldValue,
            $($($bounds)+)?
        {
            const SHAPE: FieldShape = FieldShape::$shape;
            const KIND: ValueKind = <$ty as FieldValue>::KIND;

            fn as_field_mut<L: LazyValue>(&mut self) -> FieldMut<'_, L> {
                FieldMut::Value(self)
            }
        }

        impl $(<$($generics)*>)? Element for $ty
        where
            $ty: FieldValue,
            $($($bounds)+)?
        {
            fn vec_field_mut<L: LazyValue>(vec: &mut Vec<Self>) -> FieldMut<'_, L> {
                FieldMut::Value(vec)
            }
        }
    };
}

impl_value_field!(Scalar, String);
impl_value_field!(Scalar, serde_json::Value);
impl_value_field!(Scalar, serde_yaml::Value);
impl_value_field!(Scalar, HashMap<K, V, S>, [K, V, S] where K: DeserializeOwned + Eq + Hash + 'static, V: DeserializeOwned + 'static, S: BuildHasher + Default + 'static);
impl_value_field!(Scalar, BTreeMap<K, V>, [K, V] where K: DeserializeOwned + Ord + 'static, V: DeserializeOwned + 'static);
impl_value_field!(Scalar, IndexMap<K, V, S>, [K, V, S] where K: DeserializeOwned + Eq + Hash + 'static, V: DeserializeOwned + 'static, S: BuildHasher + Default + 'static);
impl_value_field!(ScalarSeq, HashSet<T, S>, [T, S] where T: DeserializeOwned + Eq + Hash + 'static, S: BuildHasher + Default + 'static);
impl_value_field!(ScalarSeq, BTreeSet<T>, [T] where T: DeserializeOwned + Ord + 'static);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_key_prefers_named_tag() {
        static KEYS: &[(&str, &str)] = &[("yaml", "port,omitempty"), ("key", "fallback")];
        let desc = FieldDescriptor::new::<u16>("port", "u16").with_keys(KEYS);

        assert_eq!(desc.source_key("yaml"), "port");
        assert_eq!(desc.source_key("json"), "fallback");
    }

    #[test]
    fn test_source_key_empty_when_unbound() {
        static KEYS: &[(&str, &str)] = &[("yaml", "port")];
        let desc = FieldDescriptor::new::<u16>("port", "u16").with_keys(KEYS);

        assert_eq!(desc.source_key("json"), "");
    }

    #[test]
    fn test_descriptor_shapes() {
        assert_eq!(FieldDescriptor::new::<u8>("a", "u8").shape, FieldShape::Scalar);
        assert_eq!(
            FieldDescriptor::new::<Vec<String>>("b", "Vec<String>").shape,
            FieldShape::ScalarSeq
        );
        assert_eq!(
            FieldDescriptor::new::<Option<i64>>("c", "Option<i64>").kind,
            ValueKind::I64
        );
        assert_eq!(
            FieldDescriptor::new::<HashMap<String, u8>>("d", "HashMap<String, u8>").kind,
            ValueKind::Map
        );
    }

    #[test]
    fn test_builder_methods() {
        let desc = FieldDescriptor::new::<u8>("level", "u8")
            .with_validate("required,<10")
            .with_default("3");
        assert_eq!(desc.validate, Some("required,<10"));
        assert_eq!(desc.default, Some("3"));
    }
}
