//! Value kinds and the read-only view validators evaluate.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::{BuildHasher, Hash};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;

/// Kind of a field's value, used to pick validator factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `i128`
    I128,
    /// `isize`
    Isize,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `u128`
    U128,
    /// `usize`
    Usize,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `char`
    Char,
    /// `String`
    String,
    /// Sequences and sets.
    Seq,
    /// Maps.
    Map,
    /// A nested record.
    Record,
    /// Anything else (custom scalars, generic documents, paths).
    Other,
}

impl ValueKind {
    /// Every numeric kind, in declaration order.
    pub const NUMERIC: [Self; 14] = [
        Self::I8,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::I128,
        Self::Isize,
        Self::U8,
        Self::U16,
        Self::U32,
        Self::U64,
        Self::U128,
        Self::Usize,
        Self::F32,
        Self::F64,
    ];

    /// Kinds whose values have a length.
    pub const COUNTABLE: [Self; 3] = [Self::String, Self::Seq, Self::Map];

    /// Returns `true` for integer and floating point kinds.
    pub fn is_numeric(self) -> bool {
        Self::NUMERIC.contains(&self)
    }

    /// Returns `true` for strings, sequences and maps.
    pub fn is_countable(self) -> bool {
        Self::COUNTABLE.contains(&self)
    }

    /// Returns a lowercase name for messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::I128 => "i128",
            Self::Isize => "isize",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::U128 => "u128",
            Self::Usize => "usize",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Char => "char",
            Self::String => "string",
            Self::Seq => "sequence",
            Self::Map => "map",
            Self::Record => "record",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read-only view of a decoded field value.
///
/// Validators only ever see values through this trait.
pub trait Inspect {
    /// The value to compare, or `None` if there is nothing to check
    /// (an empty `Option`).
    fn value(&self) -> Option<&dyn Any>;

    /// Element or character count, if the value is countable.
    fn length(&self) -> Option<usize> {
        None
    }
}

/// A type that can be decoded directly into a field's storage.
pub trait FieldValue: DeserializeOwned + Inspect + 'static {
    /// Kind used to select validators.
    const KIND: ValueKind;
}

/// Implements [`Inspect`], [`FieldValue`], [`Field`](crate::Field) and
/// [`Element`](crate::Element) for plain scalar types.
///
/// Custom types that deserialize from a single node (enums, newtypes,
/// addresses) become usable as record fields with this macro:
///
/// ```
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// #[serde(rename_all = "lowercase")]
/// enum LogLevel {
///     Debug,
///     Info,
/// }
///
/// tagconf_core::scalar!(LogLevel);
/// ```
#[macro_export]
macro_rules! scalar {
    (@kind $ty:ty => $kind:ident) => {
        impl $crate::Inspect for $ty {
            fn value(&self) -> ::core::option::Option<&dyn ::core::any::Any> {
                ::core::option::Option::Some(self)
            }
        }

        impl $crate::FieldValue for $ty {
            const KIND: $crate::ValueKind = $crate::ValueKind::$kind;
        }

        impl $crate::Field for $ty {
            const SHAPE: $crate::FieldShape = $crate::FieldShape::Scalar;
            const KIND: $crate::ValueKind = $crate::ValueKind::$kind;

            fn as_field_mut<L: $crate::LazyValue>(&mut self) -> $crate::FieldMut<'_, L> {
                $crate::FieldMut::Value(self)
            }
        }

        impl $crate::Element for $ty {
            fn vec_field_mut<L: $crate::LazyValue>(
                vec: &mut ::std::vec::Vec<Self>,
            ) -> $crate::FieldMut<'_, L> {
                $crate::FieldMut::Value(vec)
            }
        }
    };
    ($($ty:ty),+ $(,)?) => {
        $( $crate::scalar!(@kind $ty => Other); )+
    };
}

scalar!(@kind bool => Bool);
scalar!(@kind i8 => I8);
scalar!(@kind i16 => I16);
scalar!(@kind i32 => I32);
scalar!(@kind i64 => I64);
scalar!(@kind i128 => I128);
scalar!(@kind isize => Isize);
scalar!(@kind u8 => U8);
scalar!(@kind u16 => U16);
scalar!(@kind u32 => U32);
scalar!(@kind u64 => U64);
scalar!(@kind u128 => U128);
scalar!(@kind usize => Usize);
scalar!(@kind f32 => F32);
scalar!(@kind f64 => F64);
scalar!(@kind char => Char);
scalar!(
    std::path::PathBuf,
    std::net::IpAddr,
    std::net::SocketAddr,
    std::time::Duration,
);

impl Inspect for String {
    fn value(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn length(&self) -> Option<usize> {
        Some(self.chars().count())
    }
}

impl FieldValue for String {
    const KIND: ValueKind = ValueKind::String;
}

impl<T: 'static> Inspect for Vec<T> {
    fn value(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn length(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    const KIND: ValueKind = ValueKind::Seq;
}

impl<T: FieldValue> Inspect for Option<T> {
    fn value(&self) -> Option<&dyn Any> {
        self.as_ref().and_then(Inspect::value)
    }

    fn length(&self) -> Option<usize> {
        self.as_ref().and_then(Inspect::length)
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: ValueKind = T::KIND;
}

macro_rules! impl_collection {
    ($kind:ident, $ty:ident < $($param:ident),+ > where $($bounds:tt)+) => {
        impl<$($param),+> Inspect for $ty<$($param),+> where $($bounds)+ {
            fn value(&self) -> Option<&dyn Any> {
                Some(self)
            }

            fn length(&self) -> Option<usize> {
                Some(self.len())
            }
        }

        impl<$($param),+> FieldValue for $ty<$($param),+>
        where
            $ty<$($param),+>: DeserializeOwned,
            $($bounds)+
        {
            const KIND: ValueKind = ValueKind::$kind;
        }
    };
}

impl_collection!(Map, HashMap<K, V, S> where K: 'static, V: 'static, S: BuildHasher + 'static);
impl_collection!(Map, BTreeMap<K, V> where K: 'static, V: 'static);
impl_collection!(Map, IndexMap<K, V, S> where K: 'static, V: 'static, S: BuildHasher + 'static);
impl_collection!(Seq, HashSet<T, S> where T: Eq + Hash + 'static, S: BuildHasher + 'static);
impl_collection!(Seq, BTreeSet<T> where T: 'static);

impl Inspect for serde_json::Value {
    fn value(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn length(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.chars().count()),
            Self::Array(items) => Some(items.len()),
            Self::Object(map) => Some(map.len()),
            _ => None,
        }
    }
}

impl FieldValue for serde_json::Value {
    const KIND: ValueKind = ValueKind::Other;
}

impl Inspect for serde_yaml::Value {
    fn value(&self) -> Option<&dyn Any> {
        Some(self)
    }

    fn length(&self) -> Option<usize> {
        match self {
            Self::String(s) => Some(s.chars().count()),
            Self::Sequence(items) => Some(items.len()),
            Self::Mapping(map) => Some(map.len()),
            _ => None,
        }
    }
}

impl FieldValue for serde_yaml::Value {
    const KIND: ValueKind = ValueKind::Other;
}
