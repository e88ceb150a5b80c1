//! Deferred `${...}` property resolution.
//!
//! Placeholders are resolved innermost first by the first evaluator, in
//! priority order, whose pattern matches the placeholder body. A placeholder
//! no evaluator resolves is left in place. Resolution repeats until nothing
//! changes or the iteration cap is reached.

mod evaluators;
mod path;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use thiserror::Error;

use crate::context::StepRecord;
use crate::plan::PlanNode;

pub use evaluators::{GlobalPropertyEvaluator, StepResultEvaluator};

/// Iteration cap used when none is configured.
pub const DEFAULT_MAX_ITERATIONS: usize = 16;

// A `${...}` whose body holds no other placeholder.
static INNERMOST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<body>(?:[^{}$]|\$[^{}])*)\}")
        .unwrap_or_else(|error| panic!("placeholder pattern must compile: {error}"))
});

/// Failure to evaluate a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PropertyError {
    /// A back-reference names no step run so far.
    #[error("no previous step matches the reference '{reference}'")]
    MissingStep {
        /// Position or identifier as written.
        reference: String,
    },
    /// The path selects nothing in the step result.
    #[error("the result of step '{reference}' has no value at '{path}'")]
    MissingPath {
        /// Position or identifier as written.
        reference: String,
        /// Path as written.
        path: String,
    },
    /// The path is not in the accepted subset.
    #[error("invalid result path '{path}': {reason}")]
    InvalidPath {
        /// Path as written.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A custom evaluator failed.
    #[error("property evaluator '{evaluator}' failed: {message}")]
    Evaluator {
        /// Evaluator name.
        evaluator: String,
        /// Failure description.
        message: String,
    },
}

/// What an evaluator may read.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    /// Properties inherited by the node.
    pub properties: &'a BTreeMap<String, String>,
    /// Globally configured properties.
    pub globals: &'a BTreeMap<String, String>,
    /// Results of the steps already run in the test case.
    pub results: &'a [StepRecord],
}

/// Resolves the body of one kind of placeholder.
pub trait PropertyEvaluator: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Evaluators with lower values are tried first.
    fn priority(&self) -> i32;

    /// Matched against the placeholder body to claim it.
    fn pattern(&self) -> &Regex;

    /// Whether the evaluator reads results of earlier steps.
    fn is_back_reference(&self) -> bool {
        false
    }

    /// Replacement text, or `None` to leave the placeholder unresolved.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError`] when the body is claimed but cannot be
    /// evaluated.
    fn evaluate(
        &self,
        expression: &str,
        scope: &Scope<'_>,
    ) -> Result<Option<String>, PropertyError>;
}

/// Which evaluators take part in a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveFilter {
    /// Display names: back-references are excluded.
    Name,
    /// Step text, arguments, doc strings and tables: every evaluator.
    Data,
}

impl ResolveFilter {
    fn admits(self, evaluator: &dyn PropertyEvaluator) -> bool {
        match self {
            Self::Name => !evaluator.is_back_reference(),
            Self::Data => true,
        }
    }
}

/// Text after resolution with the substitutions that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Resolved text.
    pub text: String,
    /// Placeholder as found mapped to its replacement.
    pub evaluations: BTreeMap<String, String>,
}

/// Ordered chain of evaluators.
#[derive(Clone)]
pub struct PropertyResolver {
    evaluators: Vec<Arc<dyn PropertyEvaluator>>,
    max_iterations: usize,
}

impl fmt::Debug for PropertyResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.evaluators.iter().map(|e| e.name()).collect();
        f.debug_struct("PropertyResolver")
            .field("evaluators", &names)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

impl Default for PropertyResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl PropertyResolver {
    /// A resolver with the global and step result evaluators.
    #[must_use]
    pub fn new(max_iterations: usize) -> Self {
        let mut resolver = Self::empty(max_iterations);
        resolver
            .register(GlobalPropertyEvaluator)
            .register(StepResultEvaluator);
        resolver
    }

    /// A resolver without evaluators.
    #[must_use]
    pub fn empty(max_iterations: usize) -> Self {
        Self {
            evaluators: Vec::new(),
            max_iterations,
        }
    }

    /// Add an evaluator, keeping the chain ordered by priority.
    pub fn register(&mut self, evaluator: impl PropertyEvaluator + 'static) -> &mut Self {
        self.evaluators.push(Arc::new(evaluator));
        self.evaluators.sort_by_key(|evaluator| evaluator.priority());
        self
    }

    /// Resolve every placeholder in `text`.
    ///
    /// # Errors
    ///
    /// Returns the first [`PropertyError`] raised by an evaluator.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::BTreeMap;
    /// use kumo::properties::{PropertyResolver, ResolveFilter, Scope};
    ///
    /// let globals = BTreeMap::from([
    ///     ("env".to_string(), "test".to_string()),
    ///     ("host.test".to_string(), "10.0.0.1".to_string()),
    /// ]);
    /// let empty = BTreeMap::new();
    /// let scope = Scope { properties: &empty, globals: &globals, results: &[] };
    /// let resolved = PropertyResolver::default()
    ///     .resolve("connect to ${host.${env}} as ${user}", &scope, ResolveFilter::Data)
    ///     .expect("globals resolve");
    /// assert_eq!(resolved.text, "connect to 10.0.0.1 as ${user}");
    /// assert_eq!(resolved.evaluations.len(), 2);
    /// ```
    pub fn resolve(
        &self,
        text: &str,
        scope: &Scope<'_>,
        filter: ResolveFilter,
    ) -> Result<Resolved, PropertyError> {
        let mut resolved = Resolved {
            text: text.to_string(),
            evaluations: BTreeMap::new(),
        };
        let mut iterations = 0;
        while let Some((range, replacement)) =
            self.next_substitution(&resolved.text, scope, filter)?
        {
            if iterations == self.max_iterations {
                log::warn!(
                    "stopped resolving properties in '{text}' after {} iterations",
                    self.max_iterations
                );
                break;
            }
            iterations += 1;
            let raw = resolved.text.get(range.clone()).unwrap_or_default().to_string();
            resolved.text.replace_range(range, &replacement);
            resolved.evaluations.insert(raw, replacement);
        }
        Ok(resolved)
    }

    fn next_substitution(
        &self,
        text: &str,
        scope: &Scope<'_>,
        filter: ResolveFilter,
    ) -> Result<Option<(std::ops::Range<usize>, String)>, PropertyError> {
        for captures in INNERMOST.captures_iter(text) {
            let (Some(whole), Some(body)) = (captures.get(0), captures.name("body")) else {
                continue;
            };
            for evaluator in self
                .evaluators
                .iter()
                .filter(|evaluator| filter.admits(evaluator.as_ref()))
            {
                if !evaluator.pattern().is_match(body.as_str()) {
                    continue;
                }
                if let Some(replacement) = evaluator.evaluate(body.as_str(), scope)? {
                    return Ok(Some((whole.range(), replacement)));
                }
                break;
            }
        }
        Ok(None)
    }

    /// Resolve names and static step data across a compiled plan.
    ///
    /// Children are resolved before their parent. Back-references are left
    /// for the run, where earlier step results exist.
    ///
    /// # Errors
    ///
    /// Returns the first [`PropertyError`] raised by an evaluator.
    pub fn resolve_plan(
        &self,
        node: &mut PlanNode,
        globals: &BTreeMap<String, String>,
    ) -> Result<(), PropertyError> {
        for child in &mut node.children {
            self.resolve_plan(child, globals)?;
        }
        let properties = node.properties.clone();
        let scope = Scope {
            properties: &properties,
            globals,
            results: &[],
        };
        let resolve = |text: &str| {
            self.resolve(text, &scope, ResolveFilter::Name)
                .map(|resolved| resolved.text)
        };
        node.name = resolve(&node.name)?;
        if let Some(description) = node.description.as_mut() {
            *description = resolve(description)?;
        }
        if let Some(step) = node.step.as_mut() {
            if let Some(doc) = step.doc_string.as_mut() {
                doc.content = resolve(&doc.content)?;
            }
            for cell in step.data_table.iter_mut().flatten().flatten() {
                *cell = resolve(cell)?;
            }
        }
        Ok(())
    }
}
