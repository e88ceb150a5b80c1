//! Expression specificity calculation for disambiguation.
//!
//! When multiple step expressions match the same step text, this module
//! provides scoring to select the most specific match. More specific
//! expressions have more literal text, fewer wildcards and fewer placeholders.

use crate::PatternError;
use crate::expression::lexer::{Token, lex_expression};
use std::cmp::Ordering;

/// Specificity score for a step expression.
///
/// Used to rank expressions when multiple match the same step text. Higher
/// scores indicate more specific expressions that should take precedence.
///
/// # Ordering
///
/// Expressions are compared by:
/// 1. More literal characters → more specific
/// 2. Fewer wildcards → more specific
/// 3. Fewer placeholders → more specific
///
/// # Examples
///
/// ```
/// use kumo_patterns::SpecificityScore;
///
/// let specific = SpecificityScore::calculate("the output is foo")
///     .expect("valid specific expression");
/// let generic = SpecificityScore::calculate("the output is {word}")
///     .expect("valid generic expression");
/// assert!(specific > generic);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecificityScore {
    /// Number of literal characters that must appear in matching text.
    pub literal_chars: usize,
    /// Number of typed placeholders.
    pub placeholder_count: usize,
    /// Number of `*` wildcards.
    pub wildcard_count: usize,
}

impl SpecificityScore {
    /// Calculate the specificity score for an expression string.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the expression contains invalid syntax.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumo_patterns::SpecificityScore;
    ///
    /// let score = SpecificityScore::calculate("I have {count:integer} apple(s)")
    ///     .expect("valid expression");
    /// assert_eq!(score.literal_chars, 13); // "I have " + " apple"
    /// assert_eq!(score.placeholder_count, 1);
    /// ```
    pub fn calculate(expression: &str) -> Result<Self, PatternError> {
        Ok(Self::from_tokens(&lex_expression(expression)?))
    }

    pub(crate) fn from_tokens(tokens: &[Token]) -> Self {
        let mut score = Self::default();
        for token in tokens {
            match token {
                Token::Literal(text) => score.literal_chars += text.chars().count(),
                Token::Placeholder { .. } => score.placeholder_count += 1,
                Token::Wildcard { .. } => score.wildcard_count += 1,
                // Only the shortest alternative is guaranteed to appear.
                Token::Alternatives { options, .. } => {
                    score.literal_chars += options
                        .iter()
                        .map(|option| option.chars().count())
                        .min()
                        .unwrap_or_default();
                }
                Token::Optional { .. } => {}
                Token::OpenBrace { .. } | Token::CloseBrace { .. } => score.literal_chars += 1,
            }
        }
        score
    }
}

impl Ord for SpecificityScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.literal_chars
            .cmp(&other.literal_chars)
            .then_with(|| other.wildcard_count.cmp(&self.wildcard_count))
            .then_with(|| other.placeholder_count.cmp(&self.placeholder_count))
    }
}

impl PartialOrd for SpecificityScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(expression: &str) -> SpecificityScore {
        match SpecificityScore::calculate(expression) {
            Ok(s) => s,
            Err(e) => panic!("expression {expression:?} should calculate successfully: {e}"),
        }
    }

    #[test]
    fn literal_only_expression_has_highest_specificity() {
        let literal = score("overlap apples");
        let with_placeholder = score("overlap {word}");

        assert!(literal > with_placeholder);
        assert_eq!(literal.placeholder_count, 0);
        assert_eq!(with_placeholder.placeholder_count, 1);
    }

    #[test]
    fn more_literal_chars_wins() {
        let more_literal = score("the output is the workspace executable {text}");
        let less_literal = score("the output is {text}");
        assert!(more_literal > less_literal);
    }

    #[test]
    fn fewer_placeholders_wins_with_equal_literals() {
        let a = score("ab {word}");
        let b = score("a {word} {word}");

        assert_eq!(a.literal_chars, 3);
        assert_eq!(b.literal_chars, 3);
        assert!(a > b, "fewer placeholders should win when literals equal");
    }

    #[test]
    fn wildcard_ranks_below_placeholder() {
        let typed = score("count is {integer}");
        let wildcard = score("count is *");

        assert_eq!(typed.literal_chars, wildcard.literal_chars);
        assert!(typed > wildcard);
    }

    #[test]
    fn optional_text_does_not_count() {
        let optional = score("apple(s)");
        assert_eq!(optional.literal_chars, 5);
    }

    #[test]
    fn alternatives_count_shortest_option() {
        let alternatives = score("I eat|devour");
        assert_eq!(alternatives.literal_chars, 5);
    }

    #[test]
    fn empty_expression_has_zero_specificity() {
        assert_eq!(score(""), SpecificityScore::default());
    }

    #[test]
    fn escaped_braces_count_as_literals() {
        let escaped = score("value is {{x}}");
        assert_eq!(escaped.literal_chars, 12);
        assert_eq!(escaped.placeholder_count, 0);
    }

    #[test]
    fn multibyte_characters_counted_correctly() {
        let unicode = score("café {word}");
        assert_eq!(unicode.literal_chars, 5);
        assert_eq!(unicode.placeholder_count, 1);
    }
}
