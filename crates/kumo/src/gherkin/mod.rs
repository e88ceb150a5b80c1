//! Gherkin document parsing.
//!
//! [`parse`] turns document text into a [`Document`] syntax tree. The keyword
//! language comes from a leading `# language:` directive when present and from
//! the caller otherwise.

pub mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::{
    Background, Comment, DataTable, DocString, Document, Examples, Feature, Header, Location,
    Scenario, ScenarioDefinition, ScenarioOutline, Step, StepArgument, TableCell, TableRow, Tag,
};
pub use error::{ParseError, ParseErrorKind, ParseErrors};

/// Parse a document written in `language` unless it declares its own.
///
/// # Errors
///
/// Returns every structural error found, ordered by location.
///
/// # Examples
///
/// ```
/// let document = kumo::gherkin::parse(
///     "Feature: Billing\n  Scenario: Paying\n    Given an open invoice\n",
///     "en",
/// )
/// .expect("well-formed document");
/// let feature = document.feature.expect("feature present");
/// assert_eq!(feature.header.name, "Billing");
/// ```
pub fn parse(text: &str, language: &str) -> Result<Document, ParseErrors> {
    parser::parse_document(text, language)
}
