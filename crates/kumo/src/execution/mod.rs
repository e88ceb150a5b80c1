//! Depth-first execution of a compiled plan.
//!
//! The [`PlanRunner`] walks the plan once, keeping every node's
//! [`ExecutionState`] in an [`ExecutionTable`] beside the tree rather than in
//! it. Each test case gets its own [`Backend`] from a [`BackendFactory`];
//! steps after the first non-passing step of a test case are skipped, and
//! branch results are the most severe result of their children.
//!
//! A failing step never aborts the run. Only misuse of the state machine does,
//! because it means the walker itself is broken.

mod backend;
mod error;
mod result;
mod state;

#[cfg(test)]
mod tests;

pub use backend::{Backend, BackendFactory, RegistryBackend, RegistryBackendFactory, StepReport};
pub use error::{BackendError, RunStateError, StateError};
pub use result::{NodeResult, SeverityOrder, SeverityOrderError, UnknownResult};
pub use state::{ExecutionState, ExecutionStatus, ExecutionTable};

use crate::events::{Event, EventBus, EventKind, EventObserver};
use crate::localization;
use crate::plan::{NodeKind, PlanNode};

/// Walks a plan and records what happened to each node.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use kumo::execution::{PlanRunner, RegistryBackendFactory};
/// use kumo::plan::{CompileOptions, PlanCompiler};
/// use kumo::{NodeResult, Registry, gherkin};
///
/// let mut builder = Registry::builder();
/// builder.step("the light is {state:word}", |step| {
///     Ok(Some(serde_json::json!(step.string(0)?)))
/// });
/// let registry = Arc::new(builder.build().expect("valid steps"));
///
/// let document = gherkin::parse(
///     "Feature: Lights\n  Scenario: On\n    Given the light is on\n",
///     "en",
/// )
/// .expect("valid document");
/// let plan = PlanCompiler::new(CompileOptions::default())
///     .compile([("lights.feature", &document)], &Default::default())
///     .expect("plan compiles");
///
/// let factory = RegistryBackendFactory::new(registry);
/// let table = PlanRunner::new(&factory).run(&plan).expect("consistent states");
/// assert_eq!(table.result(plan.id), Some(NodeResult::Passed));
/// ```
pub struct PlanRunner<'f, 'o> {
    factory: &'f dyn BackendFactory,
    severity: SeverityOrder,
    events: EventBus<'o>,
}

impl std::fmt::Debug for PlanRunner<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanRunner")
            .field("severity", &self.severity)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl<'f, 'o> PlanRunner<'f, 'o> {
    /// A runner obtaining backends from `factory`.
    #[must_use]
    pub fn new(factory: &'f dyn BackendFactory) -> Self {
        Self {
            factory,
            severity: SeverityOrder::default(),
            events: EventBus::new(),
        }
    }

    /// Aggregate branch results with `order`.
    #[must_use]
    pub fn with_severity_order(mut self, order: SeverityOrder) -> Self {
        self.severity = order;
        self
    }

    /// Deliver run events to `observer`.
    pub fn subscribe(&mut self, observer: impl EventObserver + 'o) -> &mut Self {
        self.events.subscribe(observer);
        self
    }

    /// Execute `plan` and return the state of every visited node.
    ///
    /// # Errors
    ///
    /// Returns [`RunStateError`] when a node would start or finish twice,
    /// which only happens when the plan reuses node identifiers.
    pub fn run(&mut self, plan: &PlanNode) -> Result<ExecutionTable, RunStateError> {
        let mut table = ExecutionTable::new();
        self.events
            .emit(&Event::new(EventKind::PlanRunStarted, plan, None));
        let result = self.run_node(plan, &mut table, None, false)?;
        log::debug!("plan '{}' finished {result}", plan.name);
        self.events
            .emit(&Event::new(EventKind::PlanRunFinished, plan, Some(result)));
        Ok(table)
    }

    fn run_node(
        &mut self,
        node: &PlanNode,
        table: &mut ExecutionTable,
        backend: Option<&mut (dyn Backend + 'static)>,
        force_skip: bool,
    ) -> Result<NodeResult, RunStateError> {
        let misuse = |source| RunStateError {
            node: node.id,
            source,
        };
        table.state_mut(node.id).mark_started().map_err(misuse)?;
        self.events
            .emit(&Event::new(EventKind::NodeRunStarted, node, None));

        let result = if node.is_test_case() {
            self.run_test_case(node, table)?
        } else if node.kind == NodeKind::Step {
            Self::run_step(node, table, backend, force_skip)
        } else {
            let empty = if node.kind == NodeKind::Background {
                NodeResult::Passed
            } else {
                NodeResult::NotImplemented
            };
            self.run_children(node, table, backend, force_skip)?
                .unwrap_or(empty)
        };

        table
            .state_mut(node.id)
            .mark_finished(result)
            .map_err(misuse)?;
        self.events
            .emit(&Event::new(EventKind::NodeRunFinished, node, Some(result)));
        Ok(result)
    }

    /// Run children in order and return their most severe result, `None`
    /// without children.
    fn run_children(
        &mut self,
        node: &PlanNode,
        table: &mut ExecutionTable,
        mut backend: Option<&mut (dyn Backend + 'static)>,
        force_skip: bool,
    ) -> Result<Option<NodeResult>, RunStateError> {
        let mut skip = force_skip;
        let mut results = Vec::with_capacity(node.children.len());
        for child in &node.children {
            let result = self.run_node(child, table, backend.as_deref_mut(), skip)?;
            if child.kind.is_step_like() && result != NodeResult::Passed {
                skip = true;
            }
            results.push(result);
        }
        Ok(self.severity.max(results))
    }

    fn run_test_case(
        &mut self,
        node: &PlanNode,
        table: &mut ExecutionTable,
    ) -> Result<NodeResult, RunStateError> {
        if node.filtered {
            log::debug!("'{}' excluded by the tag filter", node.name);
            return Ok(NodeResult::Skipped);
        }
        if !node.children.iter().any(|child| child.kind == NodeKind::Step) {
            return Ok(NodeResult::NotImplemented);
        }
        let mut backend = match self.factory.backend(node) {
            Ok(backend) => backend,
            Err(error) => {
                table.state_mut(node.id).set_error(Some(error.to_string()));
                return Ok(NodeResult::Error);
            }
        };
        let result = match backend.set_up(node) {
            Ok(()) => self
                .run_children(node, table, Some(backend.as_mut()), false)?
                .unwrap_or(NodeResult::NotImplemented),
            Err(error) => {
                log::debug!("set-up of '{}' failed: {error}", node.name);
                table.state_mut(node.id).set_error(Some(error.to_string()));
                NodeResult::Error
            }
        };
        if let Err(error) = backend.tear_down(node) {
            log::warn!("tear-down of '{}' failed: {error}", node.name);
        }
        Ok(result)
    }

    fn run_step(
        node: &PlanNode,
        table: &mut ExecutionTable,
        backend: Option<&mut (dyn Backend + 'static)>,
        force_skip: bool,
    ) -> NodeResult {
        let report = match backend {
            None => StepReport::without_invocation(
                NodeResult::Error,
                Some(localization::message("step-outside-test-case")),
            ),
            Some(backend) if force_skip => backend.skip_step(node),
            Some(backend) => backend.run_step(node),
        };
        let state = table.state_mut(node.id);
        if let (Some(started_at), Some(finished_at)) = (report.started_at, report.finished_at) {
            state.set_timing(started_at, finished_at);
        }
        state.set_error(report.error);
        state.set_arguments(report.arguments);
        report.result
    }
}
