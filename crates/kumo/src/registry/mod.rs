//! Data type and step definition registry.
//! A [`Registry`] is built once from a [`RegistryBuilder`] and shared by every
//! run. Step expressions are compiled lazily per language and cached, so
//! concurrent runs in the same language compile them once.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use hashbrown::HashMap;
use kumo_patterns::PatternError;
use thiserror::Error;

use crate::types::{DataType, Value, primary_language};

mod builder;
mod coercion;
mod definition;
mod matching;

pub use builder::{Contribution, RegistryBuilder};
pub use coercion::{Argument, CoercionError};
pub use definition::{Hook, StepDefinition, StepError, StepHandler, StepInvocation, StepOutcome};
pub use matching::Capture;

use matching::LocaleSteps;

/// Register a contribution with the process-wide inventory.
///
/// ```
/// fn register(builder: &mut kumo::RegistryBuilder) {
///     builder.step("the service is running", |_| Ok(None));
/// }
///
/// kumo::contribute!("service", register);
/// ```
#[macro_export]
macro_rules! contribute {
    ($name:expr, $register:path $(,)?) => {
        $crate::submit! {
            $crate::registry::Contribution {
                name: $name,
                register: $register,
            }
        }
    };
}

/// How a step text matched by several expressions is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AmbiguityPolicy {
    /// Several matches are reported as ambiguous.
    #[default]
    Strict,
    /// The single most specific expression wins; ties stay ambiguous.
    MostSpecific,
}

impl std::str::FromStr for AmbiguityPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "most-specific" => Ok(Self::MostSpecific),
            other => Err(format!(
                "unknown ambiguity policy '{other}', expected strict or most-specific"
            )),
        }
    }
}

/// Errors raised while building or querying the registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// An expression names a type that was never registered.
    #[error(
        "step expression '{expression}' uses unknown type '{type_name}'; available types: {}",
        available.join(", ")
    )]
    UnknownType {
        /// Offending expression.
        expression: String,
        /// Missing type.
        type_name: String,
        /// Registered type names, sorted.
        available: Vec<String>,
    },
    /// An expression is malformed or compiles to an invalid regex.
    #[error("invalid step expression '{expression}': {source}")]
    InvalidExpression {
        /// Offending expression.
        expression: String,
        /// Underlying pattern failure.
        source: PatternError,
    },
    /// Two definitions share a default expression.
    #[error("step expression '{expression}' is registered more than once")]
    DuplicateStep {
        /// Repeated expression.
        expression: String,
    },
}

/// The outcome of matching step text.
#[derive(Debug, Clone)]
pub enum StepMatch {
    /// Exactly one definition applies.
    Matched(MatchedStep),
    /// No definition matches.
    Undefined,
    /// Several definitions match; holds their expressions.
    Ambiguous(Vec<String>),
}

/// A definition selected for step text, with the captured fragments.
#[derive(Debug, Clone)]
pub struct MatchedStep {
    definition: Arc<StepDefinition>,
    expression: String,
    captures: Vec<Capture>,
}

impl MatchedStep {
    /// The selected definition.
    #[must_use]
    pub fn definition(&self) -> &StepDefinition {
        &self.definition
    }

    /// The expression that matched, in the step's language.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Captured fragments in declaration order.
    #[must_use]
    pub fn captures(&self) -> &[Capture] {
        &self.captures
    }
}

/// Frozen data types, step definitions and lifecycle hooks.
pub struct Registry {
    types: HashMap<String, DataType>,
    steps: Vec<Arc<StepDefinition>>,
    set_up: Vec<Hook>,
    tear_down: Vec<Hook>,
    ambiguity: AmbiguityPolicy,
    locales: RwLock<HashMap<String, Arc<LocaleSteps>>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.type_names())
            .field("steps", &self.steps)
            .field("ambiguity", &self.ambiguity)
            .finish_non_exhaustive()
    }
}

impl Registry {
    pub(crate) fn new(
        types: HashMap<String, DataType>,
        steps: Vec<Arc<StepDefinition>>,
        set_up: Vec<Hook>,
        tear_down: Vec<Hook>,
        ambiguity: AmbiguityPolicy,
    ) -> Self {
        Self {
            types,
            steps,
            set_up,
            tear_down,
            ambiguity,
            locales: RwLock::new(HashMap::new()),
        }
    }

    /// Start collecting definitions.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Look up a data type by name.
    #[must_use]
    pub fn data_type(&self, name: &str) -> Option<&DataType> {
        self.types.get(name)
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Registered step definitions in registration order.
    pub fn steps(&self) -> impl Iterator<Item = &StepDefinition> {
        self.steps.iter().map(AsRef::as_ref)
    }

    /// Policy applied to overlapping expressions.
    #[must_use]
    pub const fn ambiguity(&self) -> AmbiguityPolicy {
        self.ambiguity
    }

    pub(crate) fn set_up_hooks(&self) -> &[Hook] {
        &self.set_up
    }

    pub(crate) fn tear_down_hooks(&self) -> &[Hook] {
        &self.tear_down
    }

    /// Resolve step text written in `language` to a definition.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidExpression`] when an expression fails
    /// to compile with the regular expressions of `language`.
    pub fn match_step(&self, language: &str, text: &str) -> Result<StepMatch, RegistryError> {
        let steps = self.locale(language)?;
        let mut candidates = steps.candidates(text);
        if candidates.len() > 1 && self.ambiguity == AmbiguityPolicy::MostSpecific {
            let best = candidates.iter().map(|(step, _)| step.specificity).max();
            candidates.retain(|(step, _)| Some(step.specificity) == best);
        }
        let outcome = if candidates.len() > 1 {
            StepMatch::Ambiguous(
                candidates
                    .iter()
                    .map(|(step, _)| step.expression.clone())
                    .collect(),
            )
        } else if let Some((step, captures)) = candidates.pop() {
            self.steps
                .get(step.definition)
                .map_or(StepMatch::Undefined, |definition| {
                    StepMatch::Matched(MatchedStep {
                        definition: Arc::clone(definition),
                        expression: step.expression.clone(),
                        captures,
                    })
                })
        } else {
            StepMatch::Undefined
        };
        match &outcome {
            StepMatch::Undefined => log::debug!("no step definition matches '{text}'"),
            StepMatch::Ambiguous(expressions) => log::debug!(
                "'{text}' matches {} step definitions: {}",
                expressions.len(),
                expressions.join(" | ")
            ),
            StepMatch::Matched(_) => {}
        }
        Ok(outcome)
    }

    /// Coerce a captured fragment with its data type.
    ///
    /// # Errors
    ///
    /// Returns [`CoercionError`] carrying the type's hint when the parser
    /// rejects the text or the type is unknown.
    pub fn coerce(
        &self,
        language: &str,
        type_name: &str,
        text: &str,
    ) -> Result<Value, CoercionError> {
        let Some(data_type) = self.types.get(type_name) else {
            return Err(CoercionError {
                type_name: type_name.to_string(),
                text: text.to_string(),
                hint: self.type_names().join(", "),
                reason: format!("unknown data type '{type_name}'"),
            });
        };
        data_type.parse(language, text).map_err(|error| CoercionError {
            type_name: type_name.to_string(),
            text: text.to_string(),
            hint: data_type.hint(language),
            reason: error.to_string(),
        })
    }

    fn locale(&self, language: &str) -> Result<Arc<LocaleSteps>, RegistryError> {
        let key = primary_language(language);
        if let Some(steps) = self
            .locales
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(steps));
        }
        let mut locales = self.locales.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(steps) = locales.get(&key) {
            return Ok(Arc::clone(steps));
        }
        let steps = Arc::new(LocaleSteps::compile(&key, &self.steps, &self.types)?);
        locales.insert(key, Arc::clone(&steps));
        Ok(steps)
    }
}
