//! Step definitions, handler signatures and the invocation passed to them.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::context::ScenarioContext;
use crate::plan::DocStringData;
use crate::types::{Assertion, Value, primary_language};

use super::coercion::Argument;

/// Failure reported by a step handler or lifecycle hook.
///
/// The variant decides the outcome recorded for the step: an assertion
/// finishes as `FAILED`, a skip request as `SKIPPED` and any other failure as
/// `ERROR`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StepError {
    /// An expectation about the system under test did not hold.
    #[error("{0}")]
    Assertion(String),
    /// The step asked not to be run.
    #[error("{0}")]
    Skipped(String),
    /// The step could not do its work.
    #[error("{0}")]
    Failure(String),
}

impl StepError {
    /// Build an assertion failure.
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion(message.into())
    }

    /// Build a skip request.
    pub fn skipped(message: impl Into<String>) -> Self {
        Self::Skipped(message.into())
    }

    /// Build an unexpected failure.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

/// Return type of step handlers: an optional JSON value kept for
/// back-references from later steps.
pub type StepOutcome = Result<Option<serde_json::Value>, StepError>;

/// Shared step handler.
pub type StepHandler = Arc<dyn Fn(&mut StepInvocation<'_>) -> StepOutcome + Send + Sync>;

/// Lifecycle hook run once per test case.
pub type Hook = Arc<dyn Fn(&mut ScenarioContext) -> Result<(), StepError> + Send + Sync>;

/// A step expression bound to its handler.
#[derive(Clone)]
pub struct StepDefinition {
    expression: String,
    translations: BTreeMap<String, String>,
    handler: StepHandler,
    origin: Option<String>,
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("expression", &self.expression)
            .field("translations", &self.translations)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl StepDefinition {
    /// Bind `expression` to `handler`.
    pub fn new(
        expression: impl Into<String>,
        handler: impl Fn(&mut StepInvocation<'_>) -> StepOutcome + Send + Sync + 'static,
    ) -> Self {
        Self {
            expression: expression.into(),
            translations: BTreeMap::new(),
            handler: Arc::new(handler),
            origin: None,
        }
    }

    /// Use `expression` for documents written in `language`.
    #[must_use]
    pub fn translated(mut self, language: &str, expression: impl Into<String>) -> Self {
        self.translations
            .insert(primary_language(language), expression.into());
        self
    }

    /// Record where the definition comes from, for diagnostics.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Default expression.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Expression used for `language`, falling back to the default.
    #[must_use]
    pub fn expression_for(&self, language: &str) -> &str {
        self.translations
            .get(&primary_language(language))
            .map_or(self.expression.as_str(), String::as_str)
    }

    /// Every expression the definition declares: the default first.
    pub fn expressions(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.expression.as_str())
            .chain(self.translations.values().map(String::as_str))
    }

    /// Where the definition was registered from.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub(crate) fn invoke(&self, invocation: &mut StepInvocation<'_>) -> StepOutcome {
        (self.handler)(invocation)
    }
}

/// Everything a handler can see about the step it runs.
#[derive(Debug)]
pub struct StepInvocation<'a> {
    text: &'a str,
    language: &'a str,
    arguments: &'a [Argument],
    doc_string: Option<&'a DocStringData>,
    data_table: Option<&'a [Vec<String>]>,
    context: &'a mut ScenarioContext,
}

impl<'a> StepInvocation<'a> {
    /// Describe a step about to run.
    pub fn new(
        text: &'a str,
        language: &'a str,
        arguments: &'a [Argument],
        context: &'a mut ScenarioContext,
    ) -> Self {
        Self {
            text,
            language,
            arguments,
            doc_string: None,
            data_table: None,
            context,
        }
    }

    /// Attach the step's doc string.
    #[must_use]
    pub fn with_doc_string(mut self, doc_string: Option<&'a DocStringData>) -> Self {
        self.doc_string = doc_string;
        self
    }

    /// Attach the step's data table.
    #[must_use]
    pub fn with_data_table(mut self, data_table: Option<&'a [Vec<String>]>) -> Self {
        self.data_table = data_table;
        self
    }

    /// Step text after property resolution.
    #[must_use]
    pub const fn text(&self) -> &str {
        self.text
    }

    /// Language of the document.
    #[must_use]
    pub const fn language(&self) -> &str {
        self.language
    }

    /// Coerced arguments in declaration order.
    #[must_use]
    pub const fn arguments(&self) -> &[Argument] {
        self.arguments
    }

    /// Argument value by position.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Failure`] when the expression declares fewer
    /// arguments.
    pub fn value(&self, index: usize) -> Result<&Value, StepError> {
        self.arguments
            .get(index)
            .map(|argument| &argument.value)
            .ok_or_else(|| StepError::failure(format!("step has no argument {index}")))
    }

    /// Argument value by the name given in `{name:type}`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Failure`] when no argument has that name.
    pub fn named(&self, name: &str) -> Result<&Value, StepError> {
        self.arguments
            .iter()
            .find(|argument| argument.name.as_deref() == Some(name))
            .map(|argument| &argument.value)
            .ok_or_else(|| StepError::failure(format!("step has no argument named '{name}'")))
    }

    /// Integer argument by position.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Failure`] when the argument is missing or not an
    /// integer.
    pub fn integer(&self, index: usize) -> Result<i64, StepError> {
        match self.value(index)? {
            Value::Integer(value) => Ok(*value),
            other => Err(mismatch(index, "an integer", other)),
        }
    }

    /// Decimal argument by position.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Failure`] when the argument is missing or not a
    /// decimal.
    pub fn decimal(&self, index: usize) -> Result<f64, StepError> {
        match self.value(index)? {
            Value::Decimal(value) => Ok(*value),
            other => Err(mismatch(index, "a decimal", other)),
        }
    }

    /// Text argument by position.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Failure`] when the argument is missing or not text.
    pub fn string(&self, index: usize) -> Result<&str, StepError> {
        match self.value(index)? {
            Value::Text(value) => Ok(value),
            other => Err(mismatch(index, "text", other)),
        }
    }

    /// Boolean argument by position.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Failure`] when the argument is missing or not a
    /// boolean.
    pub fn boolean(&self, index: usize) -> Result<bool, StepError> {
        match self.value(index)? {
            Value::Boolean(value) => Ok(*value),
            other => Err(mismatch(index, "a boolean", other)),
        }
    }

    /// Assertion argument by position.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Failure`] when the argument is missing or not an
    /// assertion.
    pub fn assertion(&self, index: usize) -> Result<&Assertion, StepError> {
        match self.value(index)? {
            Value::Assertion(assertion) => Ok(assertion),
            other => Err(mismatch(index, "an assertion", other)),
        }
    }

    /// Test `actual` against the assertion argument at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Assertion`] when the value does not satisfy the
    /// assertion, or [`StepError::Failure`] when the argument is not one.
    pub fn check(&self, index: usize, actual: &Value) -> Result<(), StepError> {
        let assertion = self.assertion(index)?;
        if assertion.test(actual) {
            Ok(())
        } else {
            Err(StepError::assertion(format!(
                "expected value {assertion}, but it was {actual}"
            )))
        }
    }

    /// Doc string content.
    #[must_use]
    pub fn doc_string(&self) -> Option<&str> {
        self.doc_string.map(|doc| doc.content.as_str())
    }

    /// Media type declared after the opening fence.
    #[must_use]
    pub fn media_type(&self) -> Option<&str> {
        self.doc_string.and_then(|doc| doc.media_type.as_deref())
    }

    /// Data table rows, header included.
    #[must_use]
    pub const fn data_table(&self) -> Option<&[Vec<String>]> {
        self.data_table
    }

    /// State shared with the rest of the test case.
    #[must_use]
    pub const fn context(&self) -> &ScenarioContext {
        self.context
    }

    /// Mutable state shared with the rest of the test case.
    pub fn context_mut(&mut self) -> &mut ScenarioContext {
        self.context
    }
}

fn mismatch(index: usize, expected: &str, found: &Value) -> StepError {
    StepError::failure(format!("argument {index} is not {expected}: {found}"))
}
