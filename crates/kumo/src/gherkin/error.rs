//! Structural errors reported by the document parser.

use std::fmt;

use derive_more::{Deref, From, IntoIterator};
use i18n_embed::fluent::FluentLanguageLoader;

use super::ast::Location;
use crate::localization::{message_with_loader, with_loader};

/// Kind of structural problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// The `# language:` directive names a language without keyword table.
    UnknownLanguage {
        /// Language code as written.
        language: String,
    },
    /// A line appeared where the grammar does not allow it.
    UnexpectedLine {
        /// Short description of the offending line.
        found: String,
        /// What the grammar expected at this point.
        expected: &'static str,
    },
    /// A second `Feature:` block in the same document.
    DuplicateFeature,
    /// A second `Background:` block in the same feature.
    DuplicateBackground,
    /// `Background:` declared after a scenario.
    MisplacedBackground,
    /// Tags placed before a block that cannot carry them.
    TagsNotAllowed,
    /// A tag without a name or containing whitespace.
    InvalidTag {
        /// The tag text.
        tag: String,
    },
    /// A table row whose width differs from the first row.
    InconsistentCells {
        /// Cells in the first row.
        expected: usize,
        /// Cells in the offending row.
        found: usize,
    },
    /// A table row not terminated by `|`.
    UnterminatedTableRow,
    /// A doc string whose closing fence is missing.
    UnterminatedDocString,
    /// A scenario outline without any `Examples:` block.
    MissingExamples,
    /// An `Examples:` block without a header and at least one data row.
    IncompleteExamples,
    /// `Examples:` placed under a plain scenario.
    ExamplesOutsideOutline,
}

/// A structural error with its location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// What went wrong.
    pub kind: ParseErrorKind,
    /// Where it went wrong.
    pub location: Location,
}

impl ParseError {
    pub(crate) const fn new(kind: ParseErrorKind, location: Location) -> Self {
        Self { kind, location }
    }

    /// Render the error message using the provided Fluent loader.
    #[must_use]
    pub fn format_with_loader(&self, loader: &FluentLanguageLoader) -> String {
        let line = self.location.line.to_string();
        let column = self.location.column.to_string();
        let with_location = |id: &str, extra: &dyn Fn(&mut fluent::FluentArgs<'static>)| {
            message_with_loader(loader, id, |args| {
                args.set("line", line.clone());
                args.set("column", column.clone());
                extra(args);
            })
        };
        match &self.kind {
            ParseErrorKind::UnknownLanguage { language } => {
                with_location("parse-error-unknown-language", &|args| {
                    args.set("language", language.clone());
                })
            }
            ParseErrorKind::UnexpectedLine { found, expected } => {
                with_location("parse-error-unexpected-line", &|args| {
                    args.set("found", found.clone());
                    args.set("expected", (*expected).to_string());
                })
            }
            ParseErrorKind::DuplicateFeature => {
                with_location("parse-error-duplicate-feature", &|_| {})
            }
            ParseErrorKind::DuplicateBackground => {
                with_location("parse-error-duplicate-background", &|_| {})
            }
            ParseErrorKind::MisplacedBackground => {
                with_location("parse-error-misplaced-background", &|_| {})
            }
            ParseErrorKind::TagsNotAllowed => {
                with_location("parse-error-tags-not-allowed", &|_| {})
            }
            ParseErrorKind::InvalidTag { tag } => {
                with_location("parse-error-invalid-tag", &|args| {
                    args.set("tag", tag.clone());
                })
            }
            ParseErrorKind::InconsistentCells { expected, found } => {
                with_location("parse-error-inconsistent-cells", &|args| {
                    args.set("expected", expected.to_string());
                    args.set("found", found.to_string());
                })
            }
            ParseErrorKind::UnterminatedTableRow => {
                with_location("parse-error-unterminated-table-row", &|_| {})
            }
            ParseErrorKind::UnterminatedDocString => {
                with_location("parse-error-unterminated-doc-string", &|_| {})
            }
            ParseErrorKind::MissingExamples => {
                with_location("parse-error-missing-examples", &|_| {})
            }
            ParseErrorKind::IncompleteExamples => {
                with_location("parse-error-incomplete-examples", &|_| {})
            }
            ParseErrorKind::ExamplesOutsideOutline => {
                with_location("parse-error-examples-outside-outline", &|_| {})
            }
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&with_loader(|loader| self.format_with_loader(loader)))
    }
}

impl std::error::Error for ParseError {}

/// Every structural error found in one parse pass, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Deref, From, IntoIterator)]
#[into_iterator(owned, ref)]
pub struct ParseErrors(Vec<ParseError>);

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.0 {
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_location_and_details() {
        let error = ParseError::new(
            ParseErrorKind::InconsistentCells {
                expected: 2,
                found: 3,
            },
            Location::new(7, 5),
        );
        let text = error.to_string();
        assert!(text.contains("7"), "{text}");
        assert!(text.contains('3'), "{text}");
    }

    #[test]
    fn joins_multiple_errors_per_line() {
        let errors = ParseErrors::from(vec![
            ParseError::new(ParseErrorKind::DuplicateFeature, Location::new(3, 1)),
            ParseError::new(ParseErrorKind::MissingExamples, Location::new(9, 3)),
        ]);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.to_string().lines().count(), 2);
    }
}
