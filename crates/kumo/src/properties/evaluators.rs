//! Built-in property evaluators.

use std::sync::LazyLock;

use regex::Regex;

use super::path::{parse_path, render, select};
use super::{PropertyError, PropertyEvaluator, Scope};

static PROPERTY_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][\w.-]*$")
        .unwrap_or_else(|error| panic!("property name pattern must compile: {error}"))
});

static STEP_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<step>-?\d+|\w[\w.-]*)#(?P<path>.*)$")
        .unwrap_or_else(|error| panic!("step reference pattern must compile: {error}"))
});

/// Resolves `${name}` from the node's properties, then the configured
/// globals.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalPropertyEvaluator;

impl PropertyEvaluator for GlobalPropertyEvaluator {
    fn name(&self) -> &'static str {
        "global"
    }

    fn priority(&self) -> i32 {
        1
    }

    fn pattern(&self) -> &Regex {
        &PROPERTY_NAME
    }

    fn evaluate(
        &self,
        expression: &str,
        scope: &Scope<'_>,
    ) -> Result<Option<String>, PropertyError> {
        Ok(scope
            .properties
            .get(expression)
            .or_else(|| scope.globals.get(expression))
            .cloned())
    }
}

/// Resolves `${n#path}`, `${-n#path}` and `${id#path}` against the results of
/// the steps already run in the test case.
///
/// `n` counts from 1 at the first step, `-n` counts back from the latest step
/// and `id` names a step by its identifier, `<test case id>-<n>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepResultEvaluator;

impl PropertyEvaluator for StepResultEvaluator {
    fn name(&self) -> &'static str {
        "step-result"
    }

    fn priority(&self) -> i32 {
        2
    }

    fn pattern(&self) -> &Regex {
        &STEP_REFERENCE
    }

    fn is_back_reference(&self) -> bool {
        true
    }

    fn evaluate(
        &self,
        expression: &str,
        scope: &Scope<'_>,
    ) -> Result<Option<String>, PropertyError> {
        let Some(captures) = STEP_REFERENCE.captures(expression) else {
            return Ok(None);
        };
        let reference = captures.name("step").map_or("", |m| m.as_str());
        let path = captures.name("path").map_or("", |m| m.as_str());
        let segments = parse_path(path)?;
        let missing_step = || PropertyError::MissingStep {
            reference: reference.to_string(),
        };
        let record = match reference.parse::<i64>() {
            Ok(position) if position > 0 => usize::try_from(position - 1)
                .ok()
                .and_then(|index| scope.results.get(index)),
            Ok(position) if position < 0 => usize::try_from(position.unsigned_abs())
                .ok()
                .and_then(|back| scope.results.len().checked_sub(back))
                .and_then(|index| scope.results.get(index)),
            Ok(_) => None,
            Err(_) => scope
                .results
                .iter()
                .rev()
                .find(|record| record.tag_id.as_deref() == Some(reference)),
        }
        .ok_or_else(missing_step)?;
        select(&record.value, &segments)
            .map(|value| Some(render(value)))
            .ok_or_else(|| PropertyError::MissingPath {
                reference: reference.to_string(),
                path: path.to_string(),
            })
    }
}
