//! The per-test-case collaborator that runs steps.

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::error::BackendError;
use super::result::NodeResult;
use crate::context::{ScenarioContext, StepRecord};
use crate::localization;
use crate::panic::panic_message;
use crate::plan::{DocStringData, PlanNode};
use crate::properties::{PropertyResolver, ResolveFilter, Resolved, Scope};
use crate::registry::{Argument, Hook, MatchedStep, Registry, StepError, StepInvocation, StepMatch};

/// What happened when a step was run or skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// Outcome of the step.
    pub result: NodeResult,
    /// Message explaining a non-passing outcome.
    pub error: Option<String>,
    /// Arguments bound from the step text.
    pub arguments: Vec<Argument>,
    /// Start of the handler invocation, when it was invoked.
    pub started_at: Option<DateTime<Utc>>,
    /// End of the handler invocation, when it was invoked.
    pub finished_at: Option<DateTime<Utc>>,
}

impl StepReport {
    /// A report for a step whose handler was not invoked.
    #[must_use]
    pub fn without_invocation(result: NodeResult, error: Option<String>) -> Self {
        Self {
            result,
            error,
            arguments: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }
}

/// Runs the steps of one test case.
///
/// A backend is created for each test case and dropped after its tear-down,
/// so state kept between steps never leaks into another test case.
pub trait Backend {
    /// Prepare the test case before its first step.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when the test case cannot run; its steps are
    /// then not visited.
    fn set_up(&mut self, test_case: &PlanNode) -> Result<(), BackendError>;

    /// Release the test case after its last step.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when clean-up fails. The failure is logged and
    /// does not change any result.
    fn tear_down(&mut self, test_case: &PlanNode) -> Result<(), BackendError>;

    /// Run one step.
    fn run_step(&mut self, step: &PlanNode) -> StepReport;

    /// Account for a step that is not run because an earlier one did not pass.
    fn skip_step(&mut self, step: &PlanNode) -> StepReport {
        let _ = step;
        StepReport::without_invocation(NodeResult::Skipped, None)
    }
}

/// Supplies a [`Backend`] per test case.
pub trait BackendFactory {
    /// Create the backend for `test_case`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] when no backend can serve the test case.
    fn backend(&self, test_case: &PlanNode) -> Result<Box<dyn Backend>, BackendError>;
}

/// Creates [`RegistryBackend`]s sharing one registry and resolver.
#[derive(Debug, Clone)]
pub struct RegistryBackendFactory {
    registry: Arc<Registry>,
    resolver: Arc<PropertyResolver>,
    globals: Arc<BTreeMap<String, String>>,
}

impl RegistryBackendFactory {
    /// A factory using the default property resolver and no globals.
    #[must_use]
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            resolver: Arc::new(PropertyResolver::default()),
            globals: Arc::new(BTreeMap::new()),
        }
    }

    /// Use `resolver` for run-time property resolution.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<PropertyResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Global properties visible to `${name}` placeholders.
    #[must_use]
    pub fn with_globals(mut self, globals: BTreeMap<String, String>) -> Self {
        self.globals = Arc::new(globals);
        self
    }
}

impl BackendFactory for RegistryBackendFactory {
    fn backend(&self, _test_case: &PlanNode) -> Result<Box<dyn Backend>, BackendError> {
        Ok(Box::new(RegistryBackend {
            registry: Arc::clone(&self.registry),
            resolver: Arc::clone(&self.resolver),
            globals: Arc::clone(&self.globals),
            context: ScenarioContext::new(),
        }))
    }
}

/// Runs steps with the handlers and hooks of a [`Registry`].
#[derive(Debug)]
pub struct RegistryBackend {
    registry: Arc<Registry>,
    resolver: Arc<PropertyResolver>,
    globals: Arc<BTreeMap<String, String>>,
    context: ScenarioContext,
}

impl RegistryBackend {
    /// Values shared by the steps of the current test case.
    #[must_use]
    pub const fn context(&self) -> &ScenarioContext {
        &self.context
    }

    fn run_hooks(
        hooks: &[Hook],
        context: &mut ScenarioContext,
        wrap: fn(StepError) -> BackendError,
        stop_at_first: bool,
    ) -> Result<(), BackendError> {
        let mut first_error = None;
        for hook in hooks {
            let outcome = catch_unwind(AssertUnwindSafe(|| hook(context)))
                .map_err(|payload| BackendError::Panicked(panic_message(payload.as_ref())))
                .and_then(|result| result.map_err(wrap));
            if let Err(error) = outcome {
                if stop_at_first {
                    return Err(error);
                }
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn resolve(&self, step: &PlanNode, text: &str) -> Result<Resolved, String> {
        let scope = Scope {
            properties: &step.properties,
            globals: &self.globals,
            results: self.context.results(),
        };
        self.resolver
            .resolve(text, &scope, ResolveFilter::Data)
            .map_err(|error| error.to_string())
    }

    fn bind_arguments(
        &self,
        step: &PlanNode,
        matched: &MatchedStep,
    ) -> Result<Vec<Argument>, String> {
        matched
            .captures()
            .iter()
            .map(|capture| {
                let resolved = self.resolve(step, &capture.text)?;
                let value = self
                    .registry
                    .coerce(&step.language, &capture.type_name, &resolved.text)
                    .map_err(|error| error.to_string())?;
                Ok(Argument {
                    name: capture.name.clone(),
                    type_name: capture.type_name.clone(),
                    raw: capture.text.clone(),
                    value,
                    evaluations: resolved.evaluations,
                })
            })
            .collect()
    }

    fn resolve_doc_string(&self, step: &PlanNode) -> Result<Option<DocStringData>, String> {
        let Some(doc) = step.step.as_ref().and_then(|data| data.doc_string.as_ref()) else {
            return Ok(None);
        };
        Ok(Some(DocStringData {
            media_type: doc.media_type.clone(),
            content: self.resolve(step, &doc.content)?.text,
        }))
    }

    fn resolve_table(&self, step: &PlanNode) -> Result<Option<Vec<Vec<String>>>, String> {
        let Some(rows) = step.step.as_ref().and_then(|data| data.data_table.as_ref()) else {
            return Ok(None);
        };
        rows.iter()
            .map(|row| {
                row.iter()
                    .map(|cell| self.resolve(step, cell).map(|resolved| resolved.text))
                    .collect()
            })
            .collect::<Result<Vec<Vec<String>>, String>>()
            .map(Some)
    }

    fn matched(&self, step: &PlanNode) -> Result<MatchedStep, StepReport> {
        let outcome = self
            .registry
            .match_step(&step.language, &step.name)
            .map_err(|error| {
                StepReport::without_invocation(NodeResult::Error, Some(error.to_string()))
            })?;
        match outcome {
            StepMatch::Matched(matched) => Ok(matched),
            StepMatch::Undefined => Err(StepReport::without_invocation(
                NodeResult::Undefined,
                Some(localization::message_with_args("step-undefined", |args| {
                    args.set("text", step.name.clone());
                })),
            )),
            StepMatch::Ambiguous(expressions) => Err(StepReport::without_invocation(
                NodeResult::Error,
                Some(localization::message_with_args("step-ambiguous", |args| {
                    args.set("text", step.name.clone());
                    args.set("expressions", expressions.join(", "));
                })),
            )),
        }
    }

    fn execute(&mut self, step: &PlanNode) -> Result<StepReport, StepReport> {
        let matched = self.matched(step)?;
        let error = |message| StepReport::without_invocation(NodeResult::Error, Some(message));
        let arguments = self.bind_arguments(step, &matched).map_err(error)?;
        let text = self.resolve(step, &step.name).map_err(error)?.text;
        let doc_string = self.resolve_doc_string(step).map_err(error)?;
        let data_table = self.resolve_table(step).map_err(error)?;

        let started_at = Utc::now();
        let outcome = {
            let mut invocation =
                StepInvocation::new(&text, &step.language, &arguments, &mut self.context)
                    .with_doc_string(doc_string.as_ref())
                    .with_data_table(data_table.as_deref());
            catch_unwind(AssertUnwindSafe(|| matched.definition().invoke(&mut invocation)))
        };
        let finished_at = Utc::now();

        let (result, message) = match outcome {
            Ok(Ok(value)) => {
                self.context.record(StepRecord {
                    tag_id: step.tag_id.clone(),
                    name: text,
                    value: value.unwrap_or_default(),
                });
                (NodeResult::Passed, None)
            }
            Ok(Err(StepError::Assertion(message))) => (NodeResult::Failed, Some(message)),
            Ok(Err(StepError::Skipped(message))) => (NodeResult::Skipped, Some(message)),
            Ok(Err(StepError::Failure(message))) => (NodeResult::Error, Some(message)),
            Err(payload) => (NodeResult::Error, Some(panic_message(payload.as_ref()))),
        };
        Ok(StepReport {
            result,
            error: message,
            arguments,
            started_at: Some(started_at),
            finished_at: Some(finished_at),
        })
    }
}

impl Backend for RegistryBackend {
    fn set_up(&mut self, test_case: &PlanNode) -> Result<(), BackendError> {
        log::debug!("setting up '{}'", test_case.name);
        Self::run_hooks(
            self.registry.set_up_hooks(),
            &mut self.context,
            BackendError::SetUp,
            true,
        )
    }

    fn tear_down(&mut self, test_case: &PlanNode) -> Result<(), BackendError> {
        log::debug!("tearing down '{}'", test_case.name);
        Self::run_hooks(
            self.registry.tear_down_hooks(),
            &mut self.context,
            BackendError::TearDown,
            false,
        )
    }

    fn run_step(&mut self, step: &PlanNode) -> StepReport {
        self.execute(step).unwrap_or_else(|report| report)
    }
}
