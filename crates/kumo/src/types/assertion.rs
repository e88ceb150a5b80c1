//! Assertion phrases such as `is greater than 11` or `starts with "ab"`.
//!
//! An assertion type wraps an inner value type. Its expression is the
//! alternation of every phrase template of the language with the `~x~` slot
//! replaced by the inner type's expression. Parsing tries each template
//! anchored, coerces the slot through the inner type and yields an
//! [`Assertion`] predicate instead of a plain value.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashMap;
use regex::Regex;

use super::{DataType, TypeDefinitionError, TypeError, Value, primary_language};
use crate::localization::message_in;

const SLOT: &str = "~x~";

/// Ordering comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Equal to the expected value.
    Equal,
    /// Strictly greater.
    Greater,
    /// Strictly less.
    Less,
    /// Greater or equal.
    GreaterOrEqual,
    /// Less or equal.
    LessOrEqual,
}

/// Textual match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// Whole text equal.
    Equal,
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
    /// Substring match.
    Contains,
}

/// Check that takes no expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryCheck {
    /// The value is absent.
    Null,
    /// The value is empty text.
    Empty,
    /// Either of the above.
    NullOrEmpty,
}

/// A predicate over values.
#[derive(Debug, Clone, PartialEq)]
pub enum Assertion {
    /// Ordering comparison against an expected value.
    Compare {
        /// Comparison to apply.
        op: Comparison,
        /// Whether the outcome is inverted.
        negated: bool,
        /// Value compared against.
        expected: Box<Value>,
    },
    /// Textual comparison.
    Text {
        /// Match to apply.
        op: TextMatch,
        /// Compare without regard to case.
        ignore_case: bool,
        /// Whether the outcome is inverted.
        negated: bool,
        /// Text compared against.
        expected: String,
    },
    /// Null or empty check.
    Unary {
        /// Check to apply.
        op: UnaryCheck,
        /// Whether the outcome is inverted.
        negated: bool,
    },
}

impl Assertion {
    /// Whether `actual` satisfies the assertion.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumo::types::{Assertion, Comparison, Value};
    ///
    /// let greater = Assertion::Compare {
    ///     op: Comparison::Greater,
    ///     negated: false,
    ///     expected: Box::new(Value::Integer(11)),
    /// };
    /// assert!(greater.test(&Value::Integer(12)));
    /// assert!(!greater.test(&Value::Integer(11)));
    /// ```
    #[must_use]
    pub fn test(&self, actual: &Value) -> bool {
        let (outcome, negated) = match self {
            Self::Compare {
                op,
                negated,
                expected,
            } => {
                let outcome = actual.compare(expected).is_some_and(|ordering| match op {
                    Comparison::Equal => ordering.is_eq(),
                    Comparison::Greater => ordering.is_gt(),
                    Comparison::Less => ordering.is_lt(),
                    Comparison::GreaterOrEqual => ordering.is_ge(),
                    Comparison::LessOrEqual => ordering.is_le(),
                });
                (outcome, *negated)
            }
            Self::Text {
                op,
                ignore_case,
                negated,
                expected,
            } => {
                let outcome = actual.as_text().is_some_and(|text| {
                    let (text, expected) = if *ignore_case {
                        (text.to_lowercase(), expected.to_lowercase())
                    } else {
                        (text, expected.clone())
                    };
                    match op {
                        TextMatch::Equal => text == expected,
                        TextMatch::StartsWith => text.starts_with(&expected),
                        TextMatch::EndsWith => text.ends_with(&expected),
                        TextMatch::Contains => text.contains(&expected),
                    }
                });
                (outcome, *negated)
            }
            Self::Unary { op, negated } => {
                let null = matches!(actual, Value::Null);
                let empty = matches!(actual, Value::Text(text) if text.is_empty());
                let outcome = match op {
                    UnaryCheck::Null => null,
                    UnaryCheck::Empty => empty,
                    UnaryCheck::NullOrEmpty => null || empty,
                };
                (outcome, *negated)
            }
        };
        outcome != negated
    }
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = |negated: bool| if negated { "not " } else { "" };
        match self {
            Self::Compare {
                op,
                negated,
                expected,
            } => {
                let phrase = match op {
                    Comparison::Equal => "equal to",
                    Comparison::Greater => "greater than",
                    Comparison::Less => "less than",
                    Comparison::GreaterOrEqual => "greater than or equal to",
                    Comparison::LessOrEqual => "less than or equal to",
                };
                write!(f, "is {}{phrase} {expected}", not(*negated))
            }
            Self::Text {
                op,
                ignore_case,
                negated,
                expected,
            } => {
                let phrase = match op {
                    TextMatch::Equal => "equal to",
                    TextMatch::StartsWith => "starting with",
                    TextMatch::EndsWith => "ending with",
                    TextMatch::Contains => "containing",
                };
                write!(f, "is {}{phrase} \"{expected}\"", not(*negated))?;
                if *ignore_case {
                    f.write_str(" ignoring case")?;
                }
                Ok(())
            }
            Self::Unary { op, negated } => {
                let phrase = match op {
                    UnaryCheck::Null => "null",
                    UnaryCheck::Empty => "empty",
                    UnaryCheck::NullOrEmpty => "null or empty",
                };
                write!(f, "is {}{phrase}", not(*negated))
            }
        }
    }
}

/// What an assertion type compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    /// Ordered values: numbers, dates, durations.
    Comparable,
    /// Text.
    Textual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phrase {
    Compare(Comparison, bool),
    Text(TextMatch, bool, bool),
    Unary(UnaryCheck, bool),
}

type Templates = &'static [(&'static str, Phrase)];

struct PhraseTable {
    comparable: Templates,
    textual: Templates,
    unary: Templates,
}

const ENGLISH: PhraseTable = PhraseTable {
    comparable: &[
        ("is equal to ~x~", Phrase::Compare(Comparison::Equal, false)),
        ("is not equal to ~x~", Phrase::Compare(Comparison::Equal, true)),
        ("is greater than ~x~", Phrase::Compare(Comparison::Greater, false)),
        ("is not greater than ~x~", Phrase::Compare(Comparison::Greater, true)),
        ("is less than ~x~", Phrase::Compare(Comparison::Less, false)),
        ("is not less than ~x~", Phrase::Compare(Comparison::Less, true)),
        ("is greater than or equal to ~x~", Phrase::Compare(Comparison::GreaterOrEqual, false)),
        ("is not greater than or equal to ~x~", Phrase::Compare(Comparison::GreaterOrEqual, true)),
        ("is less than or equal to ~x~", Phrase::Compare(Comparison::LessOrEqual, false)),
        ("is not less than or equal to ~x~", Phrase::Compare(Comparison::LessOrEqual, true)),
    ],
    textual: &[
        ("is equal to ~x~", Phrase::Text(TextMatch::Equal, false, false)),
        ("is equal to ~x~ ignoring case", Phrase::Text(TextMatch::Equal, false, true)),
        ("is not equal to ~x~", Phrase::Text(TextMatch::Equal, true, false)),
        ("is not equal to ~x~ ignoring case", Phrase::Text(TextMatch::Equal, true, true)),
        ("starts with ~x~", Phrase::Text(TextMatch::StartsWith, false, false)),
        ("starts with ~x~ ignoring case", Phrase::Text(TextMatch::StartsWith, false, true)),
        ("does not start with ~x~", Phrase::Text(TextMatch::StartsWith, true, false)),
        ("does not start with ~x~ ignoring case", Phrase::Text(TextMatch::StartsWith, true, true)),
        ("ends with ~x~", Phrase::Text(TextMatch::EndsWith, false, false)),
        ("ends with ~x~ ignoring case", Phrase::Text(TextMatch::EndsWith, false, true)),
        ("does not end with ~x~", Phrase::Text(TextMatch::EndsWith, true, false)),
        ("does not end with ~x~ ignoring case", Phrase::Text(TextMatch::EndsWith, true, true)),
        ("contains ~x~", Phrase::Text(TextMatch::Contains, false, false)),
        ("contains ~x~ ignoring case", Phrase::Text(TextMatch::Contains, false, true)),
        ("does not contain ~x~", Phrase::Text(TextMatch::Contains, true, false)),
        ("does not contain ~x~ ignoring case", Phrase::Text(TextMatch::Contains, true, true)),
    ],
    unary: &[
        ("is null", Phrase::Unary(UnaryCheck::Null, false)),
        ("is not null", Phrase::Unary(UnaryCheck::Null, true)),
        ("is empty", Phrase::Unary(UnaryCheck::Empty, false)),
        ("is not empty", Phrase::Unary(UnaryCheck::Empty, true)),
        ("is null or empty", Phrase::Unary(UnaryCheck::NullOrEmpty, false)),
        ("is not null or empty", Phrase::Unary(UnaryCheck::NullOrEmpty, true)),
    ],
};

const SPANISH: PhraseTable = PhraseTable {
    comparable: &[
        ("es igual a ~x~", Phrase::Compare(Comparison::Equal, false)),
        ("no es igual a ~x~", Phrase::Compare(Comparison::Equal, true)),
        ("es mayor que ~x~", Phrase::Compare(Comparison::Greater, false)),
        ("no es mayor que ~x~", Phrase::Compare(Comparison::Greater, true)),
        ("es menor que ~x~", Phrase::Compare(Comparison::Less, false)),
        ("no es menor que ~x~", Phrase::Compare(Comparison::Less, true)),
        ("es mayor o igual que ~x~", Phrase::Compare(Comparison::GreaterOrEqual, false)),
        ("no es mayor o igual que ~x~", Phrase::Compare(Comparison::GreaterOrEqual, true)),
        ("es menor o igual que ~x~", Phrase::Compare(Comparison::LessOrEqual, false)),
        ("no es menor o igual que ~x~", Phrase::Compare(Comparison::LessOrEqual, true)),
    ],
    textual: &[
        ("es igual a ~x~", Phrase::Text(TextMatch::Equal, false, false)),
        ("es igual a ~x~ sin distinguir mayúsculas", Phrase::Text(TextMatch::Equal, false, true)),
        ("no es igual a ~x~", Phrase::Text(TextMatch::Equal, true, false)),
        ("no es igual a ~x~ sin distinguir mayúsculas", Phrase::Text(TextMatch::Equal, true, true)),
        ("empieza por ~x~", Phrase::Text(TextMatch::StartsWith, false, false)),
        ("empieza por ~x~ sin distinguir mayúsculas", Phrase::Text(TextMatch::StartsWith, false, true)),
        ("no empieza por ~x~", Phrase::Text(TextMatch::StartsWith, true, false)),
        ("no empieza por ~x~ sin distinguir mayúsculas", Phrase::Text(TextMatch::StartsWith, true, true)),
        ("acaba en ~x~", Phrase::Text(TextMatch::EndsWith, false, false)),
        ("acaba en ~x~ sin distinguir mayúsculas", Phrase::Text(TextMatch::EndsWith, false, true)),
        ("no acaba en ~x~", Phrase::Text(TextMatch::EndsWith, true, false)),
        ("no acaba en ~x~ sin distinguir mayúsculas", Phrase::Text(TextMatch::EndsWith, true, true)),
        ("contiene ~x~", Phrase::Text(TextMatch::Contains, false, false)),
        ("contiene ~x~ sin distinguir mayúsculas", Phrase::Text(TextMatch::Contains, false, true)),
        ("no contiene ~x~", Phrase::Text(TextMatch::Contains, true, false)),
        ("no contiene ~x~ sin distinguir mayúsculas", Phrase::Text(TextMatch::Contains, true, true)),
    ],
    unary: &[
        ("es nulo", Phrase::Unary(UnaryCheck::Null, false)),
        ("no es nulo", Phrase::Unary(UnaryCheck::Null, true)),
        ("está vacío", Phrase::Unary(UnaryCheck::Empty, false)),
        ("no está vacío", Phrase::Unary(UnaryCheck::Empty, true)),
        ("es nulo o vacío", Phrase::Unary(UnaryCheck::NullOrEmpty, false)),
        ("no es nulo o vacío", Phrase::Unary(UnaryCheck::NullOrEmpty, true)),
    ],
};

fn table(language: &str) -> &'static PhraseTable {
    match primary_language(language).as_str() {
        "es" => &SPANISH,
        _ => &ENGLISH,
    }
}

fn templates(language: &str, family: Family) -> impl Iterator<Item = &'static (&'static str, Phrase)> {
    let table = table(language);
    let own = match family {
        Family::Comparable => table.comparable,
        Family::Textual => table.textual,
    };
    own.iter().chain(table.unary)
}

/// Expand a template, replacing the slot with `slot` and escaping the rest.
fn expand(template: &str, slot: &str) -> String {
    template
        .split(SLOT)
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(slot)
}

type Compiled = Arc<Vec<(Regex, Phrase)>>;

/// Anchored template expressions, compiled once per language.
struct PhraseCache {
    family: Family,
    inner: DataType,
    compiled: RwLock<HashMap<String, Compiled>>,
}

impl PhraseCache {
    fn get(&self, language: &str) -> Result<Compiled, regex::Error> {
        let key = primary_language(language);
        if let Some(found) = self
            .compiled
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(found));
        }
        let slot = format!("(?P<x>{})", self.inner.regex(language));
        let compiled = templates(language, self.family)
            .map(|(template, phrase)| {
                Regex::new(&format!("^{}$", expand(template, &slot))).map(|re| (re, *phrase))
            })
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "compiled {} assertion phrases for type '{}' in '{key}'",
            compiled.len(),
            self.inner.name()
        );
        let mut guard = self
            .compiled
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(guard.entry(key).or_insert_with(|| Arc::new(compiled))))
    }

    fn parse(&self, type_name: &str, language: &str, text: &str) -> Result<Value, TypeError> {
        let text = text.trim();
        let compiled = self
            .get(language)
            .map_err(|_| TypeError::malformed(type_name, text))?;
        for (re, phrase) in compiled.iter() {
            let Some(caps) = re.captures(text) else {
                continue;
            };
            let slot_value = || {
                caps.name("x").map_or_else(
                    || Ok(Value::Null),
                    |slot| self.inner.parse(language, slot.as_str()),
                )
            };
            let assertion = match *phrase {
                Phrase::Compare(op, negated) => Assertion::Compare {
                    op,
                    negated,
                    expected: Box::new(slot_value()?),
                },
                Phrase::Text(op, negated, ignore_case) => Assertion::Text {
                    op,
                    ignore_case,
                    negated,
                    expected: slot_value()?.as_text().unwrap_or_default(),
                },
                Phrase::Unary(op, negated) => Assertion::Unary { op, negated },
            };
            return Ok(Value::Assertion(assertion));
        }
        Err(TypeError::malformed(type_name, text))
    }
}

/// Build an assertion type over `inner`.
pub(crate) fn assertion_type(
    name: &str,
    family: Family,
    inner: DataType,
) -> Result<DataType, TypeDefinitionError> {
    let cache = Arc::new(PhraseCache {
        family,
        inner: inner.clone(),
        compiled: RwLock::new(HashMap::new()),
    });
    let parse_name = name.to_string();
    let regex_inner = inner.clone();
    DataType::new(
        name,
        move |language| {
            let slot = regex_inner.regex(language);
            templates(language, family)
                .map(|(template, _)| expand(template, &slot))
                .collect::<Vec<_>>()
                .join("|")
        },
        move |language, text| cache.parse(&parse_name, language, text),
        move |language| {
            let example = templates(language, family)
                .next()
                .map(|(template, _)| template.replace(SLOT, "…"))
                .unwrap_or_default();
            let inner_hint = inner.hint(language);
            message_in(language, "type-hint-assertion", |args| {
                args.set("example", example);
                args.set("inner", inner_hint);
            })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtin_types;

    fn builtin(name: &str) -> DataType {
        builtin_types()
            .into_iter()
            .find(|data_type| data_type.name() == name)
            .unwrap_or_else(|| panic!("{name} is built in"))
    }

    fn assertion(type_name: &str, language: &str, text: &str) -> Assertion {
        match builtin(type_name).parse(language, text) {
            Ok(Value::Assertion(assertion)) => assertion,
            other => panic!("'{text}' should parse as an assertion, got {other:?}"),
        }
    }

    #[test]
    fn greater_than_accepts_larger_values_only() {
        let predicate = assertion("integer-assertion", "en", "is greater than 11");
        assert!(predicate.test(&Value::Integer(12)));
        assert!(!predicate.test(&Value::Integer(11)));
    }

    #[test]
    fn spanish_phrases_use_local_number_format() {
        let predicate = assertion("decimal-assertion", "es", "no es menor que 1.000,5");
        assert!(predicate.test(&Value::Decimal(1000.5)));
        assert!(!predicate.test(&Value::Decimal(3.0)));
    }

    #[test]
    fn text_assertions_honour_case_folding() {
        let predicate = assertion("text-assertion", "en", "starts with \"AB\" ignoring case");
        assert!(predicate.test(&Value::Text("abc".into())));
        let strict = assertion("text-assertion", "en", "does not contain \"x\"");
        assert!(!strict.test(&Value::Text("xyz".into())));
    }

    #[test]
    fn unary_checks_apply_to_every_family() {
        let predicate = assertion("duration-assertion", "en", "is not null");
        assert!(predicate.test(&Value::Integer(0)));
        assert!(!predicate.test(&Value::Null));
        let empty = assertion("text-assertion", "es", "está vacío");
        assert!(empty.test(&Value::Text(String::new())));
    }

    #[test]
    fn type_expression_recognises_phrases() {
        let data_type = builtin("integer-assertion");
        let re = Regex::new(&format!("^{}$", data_type.regex("en")))
            .unwrap_or_else(|error| panic!("{error}"));
        assert!(re.is_match("is less than or equal to 1,000"));
        assert!(!re.is_match("is roughly 3"));
    }

    #[test]
    fn renders_readable_description() {
        let predicate = assertion("integer-assertion", "en", "is not equal to 4");
        assert_eq!(predicate.to_string(), "is not equal to 4");
    }
}
