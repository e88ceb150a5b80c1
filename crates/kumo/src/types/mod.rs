//! Data types recognised in step text.
//!
//! A [`DataType`] bundles three language-parameterised functions: a regular
//! expression fragment that recognises the value in step text, a parser that
//! coerces the matched text into a [`Value`], and a hint describing the
//! expected input. Languages are identified by their code (`en`, `es-ES`);
//! only the primary subtag selects formats.

mod assertion;
mod builtin;
mod duration;
mod number;
mod temporal;
mod value;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub use assertion::{Assertion, Comparison, TextMatch, UnaryCheck};
pub use builtin::builtin_types;
pub use value::Value;

/// Builds the regular expression fragment for a language.
pub type RegexProvider = Arc<dyn Fn(&str) -> String + Send + Sync>;
/// Coerces matched text into a value for a language.
pub type ValueParser = Arc<dyn Fn(&str, &str) -> Result<Value, TypeError> + Send + Sync>;
/// Describes the expected input for a language.
pub type HintProvider = Arc<dyn Fn(&str) -> String + Send + Sync>;
/// Renders a value in its canonical form for a language.
pub type ValueFormatter = Arc<dyn Fn(&str, &Value) -> Option<String> + Send + Sync>;

/// Pattern accepted by every type in place of a literal value so that
/// unresolved properties survive matching and are resolved before coercion.
pub const PROPERTY_REFERENCE: &str = r"\$\{[^}]+\}";

/// Failure to coerce text into a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TypeError {
    /// The text does not have the shape of the type.
    #[error("'{text}' is not a valid {type_name}")]
    Malformed {
        /// Type being parsed.
        type_name: String,
        /// Offending text.
        text: String,
    },
    /// The value lies outside the declared bounds.
    #[error("{value} is outside the range {min} to {max}")]
    OutOfRange {
        /// Parsed value.
        value: String,
        /// Inclusive lower bound.
        min: String,
        /// Inclusive upper bound.
        max: String,
    },
    /// The text is not one of the allowed options.
    #[error("'{text}' is not one of: {}", options.join(", "))]
    UnknownOption {
        /// Offending text.
        text: String,
        /// Allowed options.
        options: Vec<String>,
    },
    /// The value does not fit the numeric range of the representation.
    #[error("'{text}' overflows the {type_name} range")]
    Overflow {
        /// Type being parsed.
        type_name: String,
        /// Offending text.
        text: String,
    },
}

impl TypeError {
    pub(crate) fn malformed(type_name: &str, text: &str) -> Self {
        Self::Malformed {
            type_name: type_name.to_string(),
            text: text.to_string(),
        }
    }
}

/// Invalid data type declaration, raised when the type is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TypeDefinitionError {
    /// Lower bound greater than the upper bound.
    #[error("type '{type_name}' has minimum {min} greater than maximum {max}")]
    InvalidBounds {
        /// Type being declared.
        type_name: String,
        /// Declared lower bound.
        min: String,
        /// Declared upper bound.
        max: String,
    },
    /// Enumerated type without options.
    #[error("enumerated type '{type_name}' declares no options")]
    EmptyOptions {
        /// Type being declared.
        type_name: String,
    },
    /// Name unusable inside a `{placeholder}`.
    #[error("'{type_name}' is not a valid type name")]
    InvalidName {
        /// The rejected name.
        type_name: String,
    },
}

/// A named, language-aware data type.
#[derive(Clone)]
pub struct DataType {
    name: String,
    regex: RegexProvider,
    parser: ValueParser,
    hint: HintProvider,
    formatter: Option<ValueFormatter>,
}

impl fmt::Debug for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataType")
            .field("name", &self.name)
            .field("formatter", &self.formatter.is_some())
            .finish_non_exhaustive()
    }
}

impl DataType {
    /// Declare a type from its three language-parameterised functions.
    ///
    /// # Errors
    ///
    /// Returns [`TypeDefinitionError::InvalidName`] unless the name consists
    /// of ASCII letters, digits, `-` and `_`.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumo::types::{DataType, Value};
    ///
    /// let colour = DataType::new(
    ///     "colour",
    ///     |_| "red|green".into(),
    ///     |_, text| Ok(Value::Text(text.to_uppercase())),
    ///     |_| "red or green".into(),
    /// )
    /// .expect("valid type name");
    /// assert_eq!(colour.parse("en", "red"), Ok(Value::Text("RED".into())));
    /// ```
    pub fn new(
        name: &str,
        regex: impl Fn(&str) -> String + Send + Sync + 'static,
        parser: impl Fn(&str, &str) -> Result<Value, TypeError> + Send + Sync + 'static,
        hint: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Result<Self, TypeDefinitionError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_'));
        if !valid {
            return Err(TypeDefinitionError::InvalidName {
                type_name: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            regex: Arc::new(regex),
            parser: Arc::new(parser),
            hint: Arc::new(hint),
            formatter: None,
        })
    }

    /// Attach a canonical formatter.
    #[must_use]
    pub fn with_formatter(
        mut self,
        formatter: impl Fn(&str, &Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Type name used in `{placeholders}`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type's own expression, without the property alternative.
    #[must_use]
    pub fn base_regex(&self, language: &str) -> String {
        (self.regex)(language)
    }

    /// Expression fragment recognising a value or an unresolved property.
    #[must_use]
    pub fn regex(&self, language: &str) -> String {
        format!("(?:{}|{PROPERTY_REFERENCE})", self.base_regex(language))
    }

    /// Coerce matched text.
    ///
    /// # Errors
    ///
    /// Returns the [`TypeError`] raised by the type's parser.
    pub fn parse(&self, language: &str, text: &str) -> Result<Value, TypeError> {
        (self.parser)(language, text)
    }

    /// Human-readable description of the expected input.
    #[must_use]
    pub fn hint(&self, language: &str) -> String {
        (self.hint)(language)
    }

    /// Canonical text for `value`, when the type defines one.
    #[must_use]
    pub fn format(&self, language: &str, value: &Value) -> Option<String> {
        self.formatter.as_ref().and_then(|format| format(language, value))
    }
}

/// Primary subtag of a language code, lower-cased.
pub(crate) fn primary_language(language: &str) -> String {
    language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("en-US", "en")]
    #[case("ES_es", "es")]
    #[case("fr", "fr")]
    fn primary_language_ignores_region(#[case] code: &str, #[case] expected: &str) {
        assert_eq!(primary_language(code), expected);
    }

    #[test]
    fn rejects_names_unusable_in_placeholders() {
        let result = DataType::new("bad name", |_| String::new(), |_, _| Ok(Value::Null), |_| String::new());
        assert!(matches!(result, Err(TypeDefinitionError::InvalidName { .. })));
    }

    #[test]
    fn regex_accepts_property_references() {
        let word = builtin_types()
            .into_iter()
            .find(|data_type| data_type.name() == "word")
            .unwrap_or_else(|| panic!("word type is built in"));
        let re = regex::Regex::new(&format!("^{}$", word.regex("en")))
            .unwrap_or_else(|error| panic!("{error}"));
        assert!(re.is_match("${user}"));
        assert!(re.is_match("alpha"));
        assert!(!re.is_match("two words"));
    }
}
