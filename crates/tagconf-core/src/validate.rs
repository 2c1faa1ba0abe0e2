//! Validator factories and rule compilation.
//!
//! A [`ValidatorRegistry`] maps a `(rule family, value kind)` pair to a
//! factory that turns a parsed operand into a [`Validator`] closure. The
//! built-in table covers range rules for every numeric kind and `len` rules
//! for strings, sequences and maps.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, DecodeError, Measure, ValidationError};
use crate::record::FieldDescriptor;
use crate::tag::{self, Operator, Rule, RuleFamily};
use crate::value::{Inspect, ValueKind};

/// A compiled rule, evaluated against a decoded field value.
pub type Validator = Arc<dyn Fn(&dyn Inspect) -> Result<(), ValidationError> + Send + Sync>;

/// Builds a [`Validator`] for `field` from an operator and an operand literal.
pub type ValidatorFactory =
    fn(field: &str, op: Operator, operand: &str) -> Result<Validator, BoxError>;

/// Numeric types that range rules can compare.
pub trait Numeric: Copy + PartialOrd + fmt::Display + Send + Sync + 'static {
    /// Kind that selects this type's range factory.
    const KIND: ValueKind;

    /// Parses a rule operand as this type.
    fn parse_operand(operand: &str) -> Result<Self, BoxError>;
}

macro_rules! numeric {
    ($($ty:ty => $kind:ident),+ $(,)?) => {
        $(
            impl Numeric for $ty {
                const KIND: ValueKind = ValueKind::$kind;

                fn parse_operand(operand: &str) -> Result<Self, BoxError> {
                    Ok(operand.parse::<$ty>()?)
                }
            }
        )+
    };
}

numeric!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    i128 => I128,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    u128 => U128,
    usize => Usize,
    f32 => F32,
    f64 => F64,
);

/// Compares the field's value against an operand of type `T`.
///
/// Empty optional values pass.
pub fn range_validator<T: Numeric>(
    field: &str,
    op: Operator,
    operand: &str,
) -> Result<Validator, BoxError> {
    let limit = T::parse_operand(operand)?;
    let field = field.to_owned();

    let validator: Validator = Arc::new(move |value: &dyn Inspect| -> Result<(), ValidationError> {
        let Some(any) = value.value() else {
            return Ok(());
        };
        let actual = any
            .downcast_ref::<T>()
            .ok_or_else(|| ValidationError::unsupported(&field, T::KIND.as_str()))?;

        if op.holds(actual, &limit) {
            Ok(())
        } else {
            Err(ValidationError::violated(
                &field,
                Measure::Value,
                actual,
                op,
                limit,
            ))
        }
    });
    Ok(validator)
}

/// Compares the field's element or character count against an operand.
pub fn len_validator(field: &str, op: Operator, operand: &str) -> Result<Validator, BoxError> {
    let limit = operand.parse::<usize>()?;
    let field = field.to_owned();

    let validator: Validator = Arc::new(move |value: &dyn Inspect| -> Result<(), ValidationError> {
        let Some(actual) = value.length() else {
            return match value.value() {
                None => Ok(()),
                Some(_) => Err(ValidationError::unsupported(&field, "countable")),
            };
        };

        if op.holds(&actual, &limit) {
            Ok(())
        } else {
            Err(ValidationError::violated(
                &field,
                Measure::Length,
                actual,
                op,
                limit,
            ))
        }
    });
    Ok(validator)
}

/// The parsed and compiled validation tag of one field.
#[derive(Clone, Default)]
pub struct CompiledRules {
    required: bool,
    validators: Vec<Validator>,
}

impl CompiledRules {
    /// Returns `true` if the tag contains `required`.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The compiled comparison rules, in declaration order.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Runs every validator, yielding each failure.
    pub fn check<'a>(
        &'a self,
        value: &'a dyn Inspect,
    ) -> impl Iterator<Item = ValidationError> + 'a {
        self.validators
            .iter()
            .filter_map(move |validator| (**validator)(value).err())
    }
}

impl fmt::Debug for CompiledRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRules")
            .field("required", &self.required)
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// Table of validator factories keyed by rule family and value kind.
#[derive(Clone)]
pub struct ValidatorRegistry {
    factories: HashMap<(RuleFamily, ValueKind), ValidatorFactory>,
}

impl ValidatorRegistry {
    /// Creates a registry with the built-in range and `len` factories.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        macro_rules! register_range {
            ($($ty:ty),+) => {
                $( registry.register(RuleFamily::Range, <$ty as Numeric>::KIND, range_validator::<$ty>); )+
            };
        }
        register_range!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

        for kind in ValueKind::COUNTABLE {
            registry.register(RuleFamily::Len, kind, len_validator);
        }
        registry
    }

    /// Creates a registry with no factories.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers `factory` for rules of `family` on fields of `kind`,
    /// returning the factory it replaces.
    pub fn register(
        &mut self,
        family: RuleFamily,
        kind: ValueKind,
        factory: ValidatorFactory,
    ) -> Option<ValidatorFactory> {
        self.factories.insert((family, kind), factory)
    }

    /// Returns `true` if a factory exists for the pair.
    pub fn supports(&self, family: RuleFamily, kind: ValueKind) -> bool {
        self.factories.contains_key(&(family, kind))
    }

    /// Compiles the validation tag of `desc`.
    ///
    /// Stops at the first rule that fails to parse or compile.
    pub fn compile_rules(&self, desc: &FieldDescriptor) -> Result<CompiledRules, DecodeError> {
        let mut rules = CompiledRules::default();
        let Some(validate) = desc.validate else {
            return Ok(rules);
        };

        for expr in tag::split_rules(validate) {
            match tag::parse_rule(expr, desc.name)? {
                Rule::Required => rules.required = true,
                Rule::Check {
                    family,
                    op,
                    operand,
                } => {
                    let validator = self.compile(desc, expr, family, op, operand)?;
                    rules.validators.push(validator);
                }
            }
        }

        tracing::debug!(
            field = desc.name,
            rules = validate,
            required = rules.required,
            validators = rules.validators.len(),
            "compiled validation rules"
        );
        Ok(rules)
    }

    fn compile(
        &self,
        desc: &FieldDescriptor,
        expr: &str,
        family: RuleFamily,
        op: Operator,
        operand: &str,
    ) -> Result<Validator, DecodeError> {
        let factory = self.factories.get(&(family, desc.kind)).ok_or_else(|| {
            let family = match family {
                RuleFamily::Range => "range",
                RuleFamily::Len => "len",
            };
            DecodeError::invalid_rule(
                desc.name,
                expr,
                format!(
                    "{family} rules are not supported on {} fields of type {}",
                    desc.kind, desc.type_name
                ),
            )
        })?;

        factory(desc.name, op, operand).map_err(|err| {
            DecodeError::invalid_rule(
                desc.name,
                expr,
                format!("invalid operand '{operand}' for {}: {err}", desc.kind),
            )
        })
    }
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorRegistry")
            .field("factories", &self.factories.len())
            .finish()
    }
}
