//! One-stop facade: parse, compile, resolve and run.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::config::EngineConfig;
use crate::events::EventObserver;
use crate::execution::{ExecutionTable, PlanRunner, RegistryBackendFactory, RunStateError};
use crate::gherkin::{self, Document, ParseErrors};
use crate::plan::{CompileError, PlanCompiler, PlanNode};
use crate::properties::{PropertyError, PropertyResolver};
use crate::registry::{Registry, RegistryBuilder, RegistryError};

/// Errors surfaced to the caller of an [`Engine`].
///
/// Step failures are not among them: they are recorded in the
/// [`ExecutionTable`] of the run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RunError {
    /// A document has structural errors.
    #[error("{path}:\n{errors}")]
    Parse {
        /// Path the document was read from.
        path: String,
        /// Every error found in the document.
        errors: ParseErrors,
    },
    /// The documents do not compile into a plan.
    #[error(transparent)]
    Compile(#[from] CompileError),
    /// A placeholder in a name or static step data failed to resolve.
    #[error(transparent)]
    Property(#[from] PropertyError),
    /// The registry could not be built.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// The run reused a node's execution state.
    #[error(transparent)]
    State(#[from] RunStateError),
}

/// Parses, compiles and runs documents with one configuration and registry.
///
/// # Examples
///
/// ```
/// use kumo::config::EngineConfig;
/// use kumo::{Engine, NodeResult, Registry};
///
/// let mut builder = Registry::builder();
/// builder.step("{count:integer} cucumbers", |step| {
///     Ok(Some(serde_json::json!(step.integer(0)?)))
/// });
/// let engine = Engine::new(EngineConfig::default(), builder).expect("valid registry");
///
/// let plan = engine
///     .compile_sources([(
///         "basket.feature",
///         "Feature: Basket\n  Scenario: Count\n    Given 12 cucumbers\n",
///     )])
///     .expect("plan compiles");
/// let table = engine.run(&plan).expect("run completes");
/// assert_eq!(table.result(plan.id), Some(NodeResult::Passed));
/// ```
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    registry: Arc<Registry>,
    resolver: Arc<PropertyResolver>,
}

impl Engine {
    /// Freeze `builder` with the configured ambiguity policy.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Registry`] when a step expression is invalid.
    pub fn new(config: EngineConfig, mut builder: RegistryBuilder) -> Result<Self, RunError> {
        builder.ambiguity(config.ambiguity);
        let registry = builder.build()?;
        Ok(Self::with_registry(config, Arc::new(registry)))
    }

    /// Use an already built registry.
    #[must_use]
    pub fn with_registry(config: EngineConfig, registry: Arc<Registry>) -> Self {
        let resolver = Arc::new(PropertyResolver::new(config.max_iterations));
        Self {
            config,
            registry,
            resolver,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Parse one document in the configured language.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Parse`] with every structural error.
    pub fn parse(&self, path: &str, text: &str) -> Result<Document, RunError> {
        gherkin::parse(text, &self.config.language).map_err(|errors| RunError::Parse {
            path: path.to_string(),
            errors,
        })
    }

    /// Compile parsed documents and resolve names and static step data.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Compile`] or [`RunError::Property`].
    pub fn compile<'a, I>(&self, documents: I) -> Result<PlanNode, RunError>
    where
        I: IntoIterator<Item = (&'a str, &'a Document)>,
    {
        let mut plan = PlanCompiler::new(self.config.compile.clone())
            .compile(documents, &BTreeMap::new())?;
        self.resolver.resolve_plan(&mut plan, &self.config.globals)?;
        log::debug!(
            "compiled {} features with {} test cases",
            plan.children.len(),
            plan.descendants().filter(|node| node.is_test_case()).count()
        );
        Ok(plan)
    }

    /// Parse and compile `(path, text)` pairs.
    ///
    /// # Errors
    ///
    /// Returns the first parse error, or any error of [`Engine::compile`].
    pub fn compile_sources<'a, I>(&self, sources: I) -> Result<PlanNode, RunError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let documents = sources
            .into_iter()
            .map(|(path, text)| Ok((path, self.parse(path, text)?)))
            .collect::<Result<Vec<_>, RunError>>()?;
        self.compile(documents.iter().map(|(path, document)| (*path, document)))
    }

    /// Execute `plan` with the registry's handlers.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::State`] when the plan reuses node identifiers.
    pub fn run(&self, plan: &PlanNode) -> Result<ExecutionTable, RunError> {
        self.run_observed(plan, |_: &crate::events::Event| {})
    }

    /// Execute `plan`, delivering run events to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::State`] when the plan reuses node identifiers.
    pub fn run_observed(
        &self,
        plan: &PlanNode,
        observer: impl EventObserver,
    ) -> Result<ExecutionTable, RunError> {
        let factory = RegistryBackendFactory::new(Arc::clone(&self.registry))
            .with_resolver(Arc::clone(&self.resolver))
            .with_globals(self.config.globals.clone());
        let mut runner =
            PlanRunner::new(&factory).with_severity_order(self.config.severity_order.clone());
        runner.subscribe(observer);
        Ok(runner.run(plan)?)
    }
}
