//! Search expression parsing
//!
//! Every search enters through a single string of the form
//! `biz:<target>:<keywords>`. The parser only checks the shape of the
//! expression; whether `target` names a registered handler is decided by the
//! engine.

use std::fmt;
use std::str::FromStr;

/// Literal first segment of every expression
pub const EXPRESSION_PREFIX: &str = "biz";

/// Target that fans out to every registered handler
pub const ALL_TARGET: &str = "all";

const SEPARATOR: char = ':';

/// A parsed `biz:<target>:<keywords>` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExpression {
    /// Entity tag or [`ALL_TARGET`]
    pub target: String,

    /// Free text, passed to the builders untouched
    pub keywords: String,
}

/// Returned when an expression does not match `biz:<target>:<keywords>`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid search expression {expression:?}: {reason}")]
pub struct ParseError {
    pub expression: String,
    pub reason: &'static str,
}

impl ParseError {
    fn new(expression: &str, reason: &'static str) -> Self {
        Self {
            expression: expression.to_string(),
            reason,
        }
    }
}

impl QueryExpression {
    /// Parse a raw expression.
    ///
    /// No trimming or case folding is applied: `" biz:case:x"` and
    /// `"BIZ:case:x"` are both rejected.
    pub fn parse(expr: &str) -> Result<Self, ParseError> {
        let segments: Vec<&str> = expr.split(SEPARATOR).collect();
        if segments.len() != 3 {
            return Err(ParseError::new(
                expr,
                "expected exactly three segments: biz:<target>:<keywords>",
            ));
        }

        if segments[0] != EXPRESSION_PREFIX {
            return Err(ParseError::new(expr, "expression must start with `biz`"));
        }

        Ok(Self {
            target: segments[1].to_string(),
            keywords: segments[2].to_string(),
        })
    }

    /// Whether the expression targets every registered handler
    pub fn is_all(&self) -> bool {
        self.target == ALL_TARGET
    }
}

impl FromStr for QueryExpression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            EXPRESSION_PREFIX, SEPARATOR, self.target, SEPARATOR, self.keywords
        )
    }
}
