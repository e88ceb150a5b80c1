//! Dialect tables and step-expression compilation shared by the kumo engine.
//!
//! The crate owns the language-sensitive pieces that sit below document
//! parsing and step matching: localized Gherkin keywords, the step keyword
//! classification, and the compiler that turns a step expression such as
//! `I have {count:integer} apple(s)` into an anchored regular expression.

mod capture;
mod dialect;
mod errors;
mod expression;
mod keyword;
mod specificity;

pub use capture::extract_named_values;
pub use dialect::{Dialect, TitleKeyword};
pub use errors::{PatternError, PlaceholderErrorInfo};
pub use expression::{ArgumentSlot, CompiledExpression, GroupStyle, compile_expression};
pub use keyword::StepKeyword;
pub use specificity::SpecificityScore;
