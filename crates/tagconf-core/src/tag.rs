//! Parsing of source keys and validation tags.
//!
//! A validation tag is a comma-separated list of rule expressions:
//!
//! ```text
//! required,>0,<=10,len<32
//! ```
//!
//! Each expression is either the bare keyword `required`, a comparison
//! (`<op><operand>`) or a keyword-prefixed comparison (`len<op><operand>`).

use std::fmt;

use crate::error::DecodeError;

/// Comparison operator of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `=`
    Eq,
}

impl Operator {
    /// Parses an operator token.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "=" => Some(Self::Eq),
            _ => None,
        }
    }

    /// Returns the operator token.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "=",
        }
    }

    /// Returns `true` if `actual <op> limit` holds.
    pub fn holds<T: PartialOrd + ?Sized>(self, actual: &T, limit: &T) -> bool {
        match self {
            Self::Lt => actual < limit,
            Self::Le => actual <= limit,
            Self::Gt => actual > limit,
            Self::Ge => actual >= limit,
            Self::Eq => actual == limit,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Family of a comparison rule, selected by its keyword prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleFamily {
    /// No prefix: compares the numeric value.
    Range,
    /// `len` prefix: compares the element or character count.
    Len,
}

impl RuleFamily {
    /// Returns the keyword prefix of the family.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Range => "",
            Self::Len => "len",
        }
    }
}

/// One parsed rule expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule<'a> {
    /// The field must be present in the source or have a default.
    Required,
    /// A comparison against an operand literal.
    Check {
        /// Rule family.
        family: RuleFamily,
        /// Comparison operator.
        op: Operator,
        /// Operand literal, not yet parsed.
        operand: &'a str,
    },
}

/// Returns the source key encoded in a primary tag.
///
/// Everything after the first `,` is ignored, so `"port,omitempty"`
/// yields `"port"`.
pub fn source_key(tag: &str) -> &str {
    tag.split(',').next().unwrap_or_default().trim()
}

/// Splits a validation tag into its rule expressions.
pub fn split_rules(tag: &str) -> impl Iterator<Item = &str> {
    tag.split(',').map(str::trim).filter(|rule| !rule.is_empty())
}

fn is_comparison_char(c: char) -> bool {
    matches!(c, '<' | '>' | '=')
}

/// Parses one rule expression declared on `field`.
pub fn parse_rule<'a>(expr: &'a str, field: &str) -> Result<Rule<'a>, DecodeError> {
    let keyword_len = expr
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '_'))
        .unwrap_or(expr.len());
    let (keyword, rest) = expr.split_at(keyword_len);

    let family = match keyword {
        "" => RuleFamily::Range,
        "required" if rest.is_empty() => return Ok(Rule::Required),
        "len" => RuleFamily::Len,
        _ => {
            return Err(DecodeError::invalid_rule(
                field,
                expr,
                "unrecognized validation",
            ))
        }
    };

    // A '-' after the comparison symbols starts a negative operand.
    let op_len = rest
        .find(|c: char| !is_comparison_char(c))
        .unwrap_or(rest.len());
    let (token, operand) = rest.split_at(op_len);

    let op = Operator::parse(token).ok_or_else(|| {
        DecodeError::invalid_rule(
            field,
            expr,
            format!(
                "unrecognized operator '{token}', usage: {}[< | > | <= | >= | =]<number>",
                family.keyword()
            ),
        )
    })?;

    if operand.is_empty() {
        return Err(DecodeError::invalid_rule(field, expr, "missing operand"));
    }

    Ok(Rule::Check {
        family,
        op,
        operand,
    })
}
