//! Collects types, steps and hooks before freezing them into a [`Registry`].

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use kumo_patterns::{GroupStyle, PatternError, compile_expression};

use super::definition::{Hook, StepDefinition, StepError, StepInvocation, StepOutcome};
use super::{AmbiguityPolicy, Registry, RegistryError};
use crate::context::ScenarioContext;
use crate::types::{DataType, builtin_types};

/// Registration record submitted with [`contribute!`](crate::contribute).
///
/// A contribution is a plain function that adds types, steps or hooks to a
/// builder; the bootstrap applies every linked contribution through
/// [`RegistryBuilder::with_contributions`].
#[derive(Debug)]
pub struct Contribution {
    /// Name shown in diagnostics.
    pub name: &'static str,
    /// Adds the contribution's definitions.
    pub register: fn(&mut RegistryBuilder),
}

inventory::collect!(Contribution);

/// Mutable collection of definitions.
///
/// # Examples
///
/// ```
/// use kumo::{RegistryBuilder, StepMatch};
///
/// let mut builder = RegistryBuilder::new();
/// builder.step("I have {integer} apples", |step| {
///     let count = step.integer(0)?;
///     Ok(Some(serde_json::json!(count)))
/// });
/// let registry = builder.build().expect("valid expressions");
/// let matched = registry.match_step("en", "I have 3 apples").expect("compiles");
/// assert!(matches!(matched, StepMatch::Matched(_)));
/// ```
pub struct RegistryBuilder {
    types: HashMap<String, DataType>,
    steps: Vec<StepDefinition>,
    set_up: Vec<Hook>,
    tear_down: Vec<Hook>,
    ambiguity: AmbiguityPolicy,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("types", &self.types.len())
            .field("steps", &self.steps)
            .field("ambiguity", &self.ambiguity)
            .finish_non_exhaustive()
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// A builder preloaded with the built-in data types.
    #[must_use]
    pub fn new() -> Self {
        let mut builder = Self::empty();
        for data_type in builtin_types() {
            builder.register_type(data_type);
        }
        builder
    }

    /// A builder without any data type.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
            steps: Vec::new(),
            set_up: Vec::new(),
            tear_down: Vec::new(),
            ambiguity: AmbiguityPolicy::default(),
        }
    }

    /// Add a data type, replacing any type with the same name.
    pub fn register_type(&mut self, data_type: DataType) -> &mut Self {
        let name = data_type.name().to_string();
        if self.types.insert(name.clone(), data_type).is_some() {
            log::debug!("data type '{name}' replaced");
        }
        self
    }

    /// Add a step definition.
    pub fn register_step(&mut self, definition: StepDefinition) -> &mut Self {
        self.steps.push(definition);
        self
    }

    /// Bind `expression` to `handler`.
    pub fn step(
        &mut self,
        expression: &str,
        handler: impl Fn(&mut StepInvocation<'_>) -> StepOutcome + Send + Sync + 'static,
    ) -> &mut Self {
        self.register_step(StepDefinition::new(expression, handler))
    }

    /// Run `hook` before the steps of every test case.
    pub fn on_set_up(
        &mut self,
        hook: impl Fn(&mut ScenarioContext) -> Result<(), StepError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.set_up.push(Arc::new(hook));
        self
    }

    /// Run `hook` after the steps of every test case.
    pub fn on_tear_down(
        &mut self,
        hook: impl Fn(&mut ScenarioContext) -> Result<(), StepError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.tear_down.push(Arc::new(hook));
        self
    }

    /// Choose how overlapping step expressions are resolved.
    pub fn ambiguity(&mut self, policy: AmbiguityPolicy) -> &mut Self {
        self.ambiguity = policy;
        self
    }

    /// Apply every contribution linked into the binary.
    pub fn with_contributions(&mut self) -> &mut Self {
        let mut contributions: Vec<&Contribution> =
            inventory::iter::<Contribution>.into_iter().collect();
        contributions.sort_by_key(|contribution| contribution.name);
        for contribution in contributions {
            log::debug!("applying contribution '{}'", contribution.name);
            (contribution.register)(self);
        }
        self
    }

    /// Validate every expression and freeze the definitions.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownType`] when an expression names a type
    /// that was never registered, [`RegistryError::InvalidExpression`] when an
    /// expression is malformed and [`RegistryError::DuplicateStep`] when two
    /// definitions share a default expression.
    pub fn build(self) -> Result<Registry, RegistryError> {
        self.check_steps()?;
        log::debug!(
            "registry built with {} types and {} steps",
            self.types.len(),
            self.steps.len()
        );
        Ok(Registry::new(
            self.types,
            self.steps.into_iter().map(Arc::new).collect(),
            self.set_up,
            self.tear_down,
            self.ambiguity,
        ))
    }

    fn check_steps(&self) -> Result<(), RegistryError> {
        let mut seen = hashbrown::HashSet::new();
        for definition in &self.steps {
            if !seen.insert(definition.expression()) {
                return Err(RegistryError::DuplicateStep {
                    expression: definition.expression().to_string(),
                });
            }
            for expression in definition.expressions() {
                self.validate(expression)?;
            }
        }
        Ok(())
    }

    fn validate(&self, expression: &str) -> Result<(), RegistryError> {
        match compile_expression(expression, GroupStyle::NonCapturing, |name| {
            self.types.contains_key(name).then(String::new)
        }) {
            Ok(_) => Ok(()),
            Err(PatternError::UnknownType { type_name, .. }) => {
                let mut available: Vec<String> = self.types.keys().cloned().collect();
                available.sort_unstable();
                Err(RegistryError::UnknownType {
                    expression: expression.to_string(),
                    type_name,
                    available,
                })
            }
            Err(source) => Err(RegistryError::InvalidExpression {
                expression: expression.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_types_list_the_available_ones() {
        let mut builder = RegistryBuilder::new();
        builder.step("I pick {colour}", |_| Ok(None));
        let Err(RegistryError::UnknownType {
            type_name,
            available,
            ..
        }) = builder.build()
        else {
            panic!("expected an unknown type error");
        };
        assert_eq!(type_name, "colour");
        assert!(available.iter().any(|name| name == "integer"));
        assert!(available.is_sorted());
    }

    #[test]
    fn translations_are_validated() {
        let mut builder = RegistryBuilder::new();
        builder.register_step(
            StepDefinition::new("I wait {duration}", |_| Ok(None))
                .translated("es", "espero {duracion}"),
        );
        assert!(matches!(
            builder.build(),
            Err(RegistryError::UnknownType { .. })
        ));
    }

    #[test]
    fn duplicate_expressions_are_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.step("a step", |_| Ok(None)).step("a step", |_| Ok(None));
        assert!(matches!(
            builder.build(),
            Err(RegistryError::DuplicateStep { .. })
        ));
    }

    #[test]
    fn empty_builder_knows_no_types() {
        let mut builder = RegistryBuilder::empty();
        builder.step("I have {integer} apples", |_| Ok(None));
        assert!(builder.build().is_err());
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.step("unbalanced {integer", |_| Ok(None));
        assert!(matches!(
            builder.build(),
            Err(RegistryError::InvalidExpression { .. })
        ));
    }
}
