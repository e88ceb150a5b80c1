//! Step-expression lexing and compilation helpers.

mod compiler;
pub(crate) mod lexer;
mod placeholder;
#[cfg(test)]
pub(crate) mod test_support;

use crate::errors::PatternError;
use crate::specificity::SpecificityScore;
use regex::Regex;

pub use compiler::compile_expression;

/// How argument placeholders appear in the generated regular expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStyle {
    /// Each argument becomes a named capture group (`arg0`, `arg1`, ...).
    Named,
    /// Arguments are wrapped in non-capturing groups, for embedding the
    /// expression inside a larger one.
    NonCapturing,
}

/// A typed argument declared by a step expression placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSlot {
    /// Name given in `{name:type}`, absent for `{type}`.
    pub name: Option<String>,
    /// Data type the argument is coerced to.
    pub type_name: String,
    /// Capture group holding the argument text under [`GroupStyle::Named`].
    pub group: String,
}

/// Result of compiling a step expression.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    pub(crate) expression: String,
    pub(crate) source: String,
    pub(crate) arguments: Vec<ArgumentSlot>,
    pub(crate) specificity: SpecificityScore,
}

impl CompiledExpression {
    /// The expression as written.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Anchored regular-expression source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Declared arguments in order of appearance.
    #[must_use]
    pub fn arguments(&self) -> &[ArgumentSlot] {
        &self.arguments
    }

    /// Specificity used to rank overlapping expressions.
    #[must_use]
    pub const fn specificity(&self) -> SpecificityScore {
        self.specificity
    }

    /// Compile the generated source into a [`Regex`].
    ///
    /// # Errors
    /// Returns [`PatternError::Regex`] when the source exceeds the regex
    /// engine's limits or a type contributed an invalid fragment.
    pub fn to_regex(&self) -> Result<Regex, PatternError> {
        Regex::new(&self.source).map_err(PatternError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Display;

    fn expect_ok<T, E: Display>(result: Result<T, E>, context: &str) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("{context}: {err}"),
        }
    }

    fn any_number(name: &str) -> Option<String> {
        (name == "integer").then(|| r"\d+".to_string())
    }

    #[test]
    fn compiles_literal_expressions() {
        let compiled = expect_ok(
            compile_expression("Given a step", GroupStyle::Named, any_number),
            "expression should compile",
        );
        assert_eq!(compiled.source(), "^Given a step$");
        assert_eq!(compiled.expression(), "Given a step");
        assert!(compiled.arguments().is_empty());
    }

    #[test]
    fn compiled_regex_matches_step_text() {
        let compiled = expect_ok(
            compile_expression("I have {integer} apple(s)", GroupStyle::Named, any_number),
            "expression should compile",
        );
        let regex = expect_ok(compiled.to_regex(), "regex should compile");
        assert!(regex.is_match("I have 1 apple"));
        assert!(regex.is_match("I have 3 apples"));
        assert!(!regex.is_match("I have some apples"));
    }

    #[test]
    fn surfaces_regex_compilation_errors() {
        let heavy = format!("prefix {}", "{integer}".repeat(20_000));
        let compiled = expect_ok(
            compile_expression(&heavy, GroupStyle::NonCapturing, |_| {
                Some(r"[\p{L}\d]{1,100}".into())
            }),
            "expression should compile",
        );
        assert!(matches!(
            compiled.to_regex(),
            Err(PatternError::Regex(regex::Error::CompiledTooBig(_)))
        ));
    }
}
