//! Decode and validation error types.
//!
//! Every failure found while filling a record is collected into a
//! [`DecodeErrors`] value, so one decode pass reports all problems at once.

use std::fmt;

use thiserror::Error;

use crate::tag::Operator;

/// Boxed error produced by a [`LazyValue`](crate::LazyValue) backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for a whole decode pass.
pub type DecodeResult<T> = Result<T, DecodeErrors>;

/// What a validator measured on the decoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// The value itself (range rules).
    Value,
    /// The element or character count (`len` rules).
    Length,
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::Length => f.write_str("len"),
        }
    }
}

/// A compiled validator rejected a decoded value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The value (or its length) does not satisfy the rule.
    #[error("field {field:?} with {measure} {actual} should be {op} {limit}")]
    Violated {
        /// Field name.
        field: String,
        /// Whether the value or its length was compared.
        measure: Measure,
        /// Rendered actual value or length.
        actual: String,
        /// Comparison operator of the rule.
        op: Operator,
        /// Rendered limit of the rule.
        limit: String,
    },

    /// The validator was handed a value of a type it was not compiled for.
    #[error("validator for field {field:?} cannot inspect a value that is not {expected}")]
    Unsupported {
        /// Field name.
        field: String,
        /// Type the validator was compiled for.
        expected: &'static str,
    },
}

impl ValidationError {
    /// Create a violated-rule error.
    pub fn violated(
        field: impl Into<String>,
        measure: Measure,
        actual: impl fmt::Display,
        op: Operator,
        limit: impl fmt::Display,
    ) -> Self {
        Self::Violated {
            field: field.into(),
            measure,
            actual: actual.to_string(),
            op,
            limit: limit.to_string(),
        }
    }

    /// Create an unsupported-input error.
    pub fn unsupported(field: impl Into<String>, expected: &'static str) -> Self {
        Self::Unsupported {
            field: field.into(),
            expected,
        }
    }
}

/// A single field-level failure.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Malformed validation tag or unsupported rule for the field's kind.
    #[error("invalid validation rule '{rule}' on field '{field}': {reason}")]
    InvalidRule {
        /// Field name.
        field: String,
        /// The offending rule expression.
        rule: String,
        /// Why the rule was rejected.
        reason: String,
    },

    /// A `required` field is absent and has no default.
    #[error("missing required config field '{key}' of type {type_name}")]
    MissingRequired {
        /// Source key of the field.
        key: String,
        /// Declared type of the field.
        type_name: String,
    },

    /// The source node has the wrong structure for a record or record sequence.
    #[error(
        "can't map {found} into {expected} field '{field}' of type {type_name} with fields [{}]",
        .nested_fields.join(", ")
    )]
    ShapeMismatch {
        /// Field name.
        field: String,
        /// Declared type of the field.
        type_name: String,
        /// Structure the field needs ("mapping" or "sequence").
        expected: &'static str,
        /// Concrete type of the source node.
        found: &'static str,
        /// Field names of the nested record.
        nested_fields: Vec<&'static str>,
    },

    /// The backend could not coerce the source node into the field's type.
    #[error("failed to decode field '{field}' from key '{key}': {source}")]
    Decode {
        /// Field name.
        field: String,
        /// Source key of the field.
        key: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },

    /// A validator rejected the decoded value.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A default literal or rule operand is not a valid literal of the field's type.
    #[error("invalid literal '{literal}' for field '{field}': {reason}")]
    InvalidLiteral {
        /// Field name.
        field: String,
        /// The offending literal text.
        literal: String,
        /// Parser message.
        reason: String,
    },

    /// A failure inside one element of a record sequence.
    #[error("{field}[{index}]: {source}")]
    Element {
        /// Field name of the sequence.
        field: String,
        /// Element index.
        index: usize,
        /// The element's failure.
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Create an invalid rule error.
    pub fn invalid_rule(
        field: impl Into<String>,
        rule: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidRule {
            field: field.into(),
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing required field error.
    pub fn missing_required(key: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::MissingRequired {
            key: key.into(),
            type_name: type_name.into(),
        }
    }

    /// Create a shape mismatch error.
    pub fn shape_mismatch(
        field: impl Into<String>,
        type_name: impl Into<String>,
        expected: &'static str,
        found: &'static str,
        nested_fields: Vec<&'static str>,
    ) -> Self {
        Self::ShapeMismatch {
            field: field.into(),
            type_name: type_name.into(),
            expected,
            found,
            nested_fields,
        }
    }

    /// Create a backend decode error.
    pub fn decode(
        field: impl Into<String>,
        key: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Decode {
            field: field.into(),
            key: key.into(),
            source: source.into(),
        }
    }

    /// Create an invalid literal error.
    pub fn invalid_literal(
        field: impl Into<String>,
        literal: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::InvalidLiteral {
            field: field.into(),
            literal: literal.into(),
            reason: reason.to_string(),
        }
    }

    /// Wrap an error raised inside a sequence element.
    pub fn element(field: impl Into<String>, index: usize, source: DecodeError) -> Self {
        Self::Element {
            field: field.into(),
            index,
            source: Box::new(source),
        }
    }
}

/// All failures collected during one decode pass, in field order.
#[derive(Debug, Default)]
pub struct DecodeErrors {
    errors: Vec<DecodeError>,
}

impl DecodeErrors {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a failure.
    pub fn push(&mut self, error: impl Into<DecodeError>) {
        self.errors.push(error.into());
    }

    /// Returns `true` if no failure was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the number of recorded failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterates over the recorded failures.
    pub fn iter(&self) -> std::slice::Iter<'_, DecodeError> {
        self.errors.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> DecodeResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for DecodeErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeErrors {}

impl From<DecodeError> for DecodeErrors {
    fn from(error: DecodeError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl IntoIterator for DecodeErrors {
    type Item = DecodeError;
    type IntoIter = std::vec::IntoIter<DecodeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a DecodeErrors {
    type Item = &'a DecodeError;
    type IntoIter = std::slice::Iter<'a, DecodeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
