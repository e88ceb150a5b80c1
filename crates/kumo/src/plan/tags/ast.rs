//! Parsed tag filters and their evaluation.

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use super::parser::Parser;

/// A compiled tag filter such as `@smoke and not @wip`.
#[derive(Clone, Debug)]
pub struct TagFilter {
    source: String,
    root: Expr,
}

#[derive(Clone, Debug)]
pub(super) enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Syntax error in a tag filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tag expression at byte {offset}: {reason}")]
pub struct TagFilterError {
    offset: usize,
    reason: String,
}

impl TagFilterError {
    pub(super) fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }

    /// Zero-based byte offset of the offending token.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl TagFilter {
    /// Parse a filter expression.
    ///
    /// # Errors
    ///
    /// Returns [`TagFilterError`] pointing at the first token that does not
    /// fit the grammar.
    pub fn parse(input: &str) -> Result<Self, TagFilterError> {
        let mut parser = Parser::new(input)?;
        let root = parser.parse_expression()?;
        parser.expect_end()?;
        Ok(Self {
            source: input.trim().to_string(),
            root,
        })
    }

    /// Whether a node carrying `tags` passes the filter.
    pub fn matches<'a, I>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = &'a str>,
    {
        let set: HashSet<&'a str> = tags.into_iter().collect();
        self.root.eval(&set)
    }
}

impl fmt::Display for TagFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Expr {
    fn eval(&self, tags: &HashSet<&str>) -> bool {
        match self {
            Self::Tag(tag) => tags.contains(tag.as_str()),
            Self::Not(inner) => !inner.eval(tags),
            Self::And(lhs, rhs) => lhs.eval(tags) && rhs.eval(tags),
            Self::Or(lhs, rhs) => lhs.eval(tags) || rhs.eval(tags),
        }
    }
}
