//! Unit tests for the plan runner.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::events::EventKind;
use crate::gherkin;
use crate::plan::{CompileOptions, PlanCompiler, TagFilter};
use crate::registry::{Registry, StepError};

#[derive(Debug, Default)]
struct Calls {
    set_up: usize,
    tear_down: usize,
    run: Vec<String>,
    skipped: Vec<String>,
}

/// Passes every step except those whose text names another result.
struct ScriptedBackend {
    calls: Rc<RefCell<Calls>>,
    fail_set_up: bool,
}

impl Backend for ScriptedBackend {
    fn set_up(&mut self, _: &PlanNode) -> Result<(), BackendError> {
        self.calls.borrow_mut().set_up += 1;
        if self.fail_set_up {
            return Err(BackendError::SetUp(StepError::failure("database unreachable")));
        }
        Ok(())
    }

    fn tear_down(&mut self, _: &PlanNode) -> Result<(), BackendError> {
        self.calls.borrow_mut().tear_down += 1;
        Err(BackendError::TearDown(StepError::failure("ignored")))
    }

    fn run_step(&mut self, step: &PlanNode) -> StepReport {
        self.calls.borrow_mut().run.push(step.name.clone());
        let result = step
            .name
            .rsplit(' ')
            .next()
            .and_then(|word| word.parse().ok())
            .unwrap_or(NodeResult::Passed);
        StepReport::without_invocation(result, None)
    }

    fn skip_step(&mut self, step: &PlanNode) -> StepReport {
        self.calls.borrow_mut().skipped.push(step.name.clone());
        StepReport::without_invocation(NodeResult::Skipped, None)
    }
}

#[derive(Default)]
struct ScriptedFactory {
    calls: Rc<RefCell<Calls>>,
    fail_set_up: bool,
}

impl BackendFactory for ScriptedFactory {
    fn backend(&self, _: &PlanNode) -> Result<Box<dyn Backend>, BackendError> {
        Ok(Box::new(ScriptedBackend {
            calls: Rc::clone(&self.calls),
            fail_set_up: self.fail_set_up,
        }))
    }
}

fn compile_with(text: &str, options: CompileOptions) -> PlanNode {
    let document = gherkin::parse(text, "en").unwrap_or_else(|errors| panic!("{errors}"));
    PlanCompiler::new(options)
        .compile([("test.feature", &document)], &BTreeMap::new())
        .unwrap_or_else(|error| panic!("{error}"))
}

fn compile(text: &str) -> PlanNode {
    compile_with(text, CompileOptions::default())
}

fn node<'p>(plan: &'p PlanNode, name: &str) -> &'p PlanNode {
    plan.descendants()
        .find(|node| node.name == name)
        .unwrap_or_else(|| panic!("no node named '{name}'"))
}

#[fixture]
fn factory() -> ScriptedFactory {
    ScriptedFactory::default()
}

#[rstest]
fn skips_steps_after_the_first_failure(factory: ScriptedFactory) {
    let plan = compile(
        "Feature: Checkout\n\
         \x20 Scenario: Pay\n\
         \x20   Given a basket\n\
         \x20   When payment is failed\n\
         \x20   Then a receipt\n\
         \x20   And an email\n",
    );
    let table = PlanRunner::new(&factory)
        .run(&plan)
        .unwrap_or_else(|error| panic!("{error}"));

    let calls = factory.calls.borrow();
    assert_eq!(calls.run, ["a basket", "payment is failed"]);
    assert_eq!(calls.skipped, ["a receipt", "an email"]);
    assert_eq!((calls.set_up, calls.tear_down), (1, 1));
    assert_eq!(table.result(node(&plan, "a receipt").id), Some(NodeResult::Skipped));
    assert_eq!(table.result(node(&plan, "Pay").id), Some(NodeResult::Failed));
    assert_eq!(table.result(plan.id), Some(NodeResult::Failed));
}

#[rstest]
fn background_failure_skips_the_scenario_steps(factory: ScriptedFactory) {
    let plan = compile(
        "Feature: Accounts\n\
         \x20 Background:\n\
         \x20   Given a login that is undefined\n\
         \x20 Scenario: Profile\n\
         \x20   Then the profile\n",
    );
    let table = PlanRunner::new(&factory)
        .run(&plan)
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(factory.calls.borrow().skipped, ["the profile"]);
    assert_eq!(table.result(node(&plan, "Profile").id), Some(NodeResult::Undefined));
}

#[rstest]
fn branches_take_the_most_severe_child_result(factory: ScriptedFactory) {
    let plan = compile(
        "Feature: Mixed\n\
         \x20 Scenario: One\n\
         \x20   Given it is skipped\n\
         \x20 Scenario: Two\n\
         \x20   Given it is error\n\
         \x20 Scenario: Three\n\
         \x20   Given it passes\n\
         \x20 Scenario: Four\n",
    );
    let table = PlanRunner::new(&factory)
        .run(&plan)
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(table.result(node(&plan, "Four").id), Some(NodeResult::NotImplemented));
    assert_eq!(table.result(node(&plan, "Three").id), Some(NodeResult::Passed));
    assert_eq!(table.result(plan.id), Some(NodeResult::Error));
    // The scenario without steps never asks for a backend.
    assert_eq!(factory.calls.borrow().set_up, 3);
}

#[rstest]
fn severity_order_is_configurable(factory: ScriptedFactory) {
    let plan = compile(
        "Feature: Mixed\n\
         \x20 Scenario: One\n\
         \x20   Given it is failed\n\
         \x20 Scenario: Two\n\
         \x20   Given it is error\n",
    );
    let order = "passed, not_implemented, skipped, undefined, failed, error"
        .parse()
        .unwrap_or_else(|error| panic!("{error}"));
    let table = PlanRunner::new(&factory)
        .with_severity_order(order)
        .run(&plan)
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(table.result(plan.id), Some(NodeResult::Error));
}

#[rstest]
fn set_up_failure_leaves_steps_unvisited() {
    let factory = ScriptedFactory {
        fail_set_up: true,
        ..ScriptedFactory::default()
    };
    let plan = compile("Feature: F\n  Scenario: S\n    Given a step\n");
    let table = PlanRunner::new(&factory)
        .run(&plan)
        .unwrap_or_else(|error| panic!("{error}"));

    let scenario = table
        .get(node(&plan, "S").id)
        .unwrap_or_else(|| panic!("scenario state"));
    assert_eq!(scenario.result(), Some(NodeResult::Error));
    assert!(scenario.error().is_some_and(|e| e.contains("database unreachable")));
    assert!(table.get(node(&plan, "a step").id).is_none());
    let calls = factory.calls.borrow();
    assert!(calls.run.is_empty());
    assert_eq!(calls.tear_down, 1);
}

#[rstest]
fn filtered_scenarios_are_skipped(factory: ScriptedFactory) {
    let mut options = CompileOptions::default();
    options.tag_filter = Some(TagFilter::parse("@fast").unwrap_or_else(|e| panic!("{e}")));
    options.include_filtered = true;
    let plan = compile_with(
        "Feature: Tags\n\
         \x20 @slow\n\
         \x20 Scenario: Slow\n\
         \x20   Given a step\n\
         \x20 @fast\n\
         \x20 Scenario: Fast\n\
         \x20   Given a step\n",
        options,
    );
    let table = PlanRunner::new(&factory)
        .run(&plan)
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(table.result(node(&plan, "Slow").id), Some(NodeResult::Skipped));
    assert_eq!(table.result(plan.id), Some(NodeResult::Skipped));
    assert_eq!(factory.calls.borrow().run.len(), 1);
}

#[rstest]
fn every_started_node_finishes_once(factory: ScriptedFactory) {
    let plan = compile(
        "Feature: Events\n\
         \x20 Scenario: A\n\
         \x20   Given one\n\
         \x20   Then two\n",
    );
    let mut kinds = Vec::new();
    {
        let mut runner = PlanRunner::new(&factory);
        runner.subscribe(|event: &Event| kinds.push(event.kind));
        runner.run(&plan).unwrap_or_else(|error| panic!("{error}"));
    }
    let count = |kind| kinds.iter().filter(|seen| **seen == kind).count();
    assert_eq!(kinds.first(), Some(&EventKind::PlanRunStarted));
    assert_eq!(kinds.last(), Some(&EventKind::PlanRunFinished));
    assert_eq!(count(EventKind::NodeRunStarted), plan.descendants().count());
    assert_eq!(count(EventKind::NodeRunFinished), plan.descendants().count());
}

#[rstest]
fn reusing_a_table_node_is_a_state_error(factory: ScriptedFactory) {
    let mut plan = compile("Feature: F\n  Scenario: S\n    Given a step\n");
    let duplicate = plan.children.clone();
    plan.children.extend(duplicate);
    let Err(error) = PlanRunner::new(&factory).run(&plan) else {
        panic!("the second feature reuses node identifiers");
    };
    assert_eq!(error.source, StateError::AlreadyStarted);
}

fn registry_plan(body: &str) -> PlanNode {
    compile(&format!("Feature: Registry\n  Scenario: S\n{body}"))
}

fn registry() -> Arc<Registry> {
    let mut builder = Registry::builder();
    builder
        .step("a user named {name:word}", |step| {
            Ok(Some(json!({"name": step.string(0)?, "id": 41})))
        })
        .step("user {id:integer} exists", |step| {
            let checked = step.integer(0)?;
            step.context_mut().insert("checked", json!(checked));
            Ok(None)
        })
        .step("the total {total:integer-assertion}", |step| {
            step.check(0, &crate::types::Value::Integer(12))?;
            Ok(None)
        })
        .step("it explodes", |_| panic!("boiler pressure"))
        .step("a {thing:word} step", |_| Ok(None))
        .step("a shared step", |_| Ok(None));
    Arc::new(builder.build().unwrap_or_else(|error| panic!("{error}")))
}

#[rstest]
#[case("    Given a user named ana\n    Then user ${1#$.id} exists\n", NodeResult::Passed)]
#[case("    Then the total is greater than 20\n", NodeResult::Failed)]
#[case("    Then the total is equal to 12\n", NodeResult::Passed)]
#[case("    Given nobody wrote this\n", NodeResult::Undefined)]
#[case("    Given a shared step\n", NodeResult::Error)]
#[case("    Given it explodes\n", NodeResult::Error)]
#[case("    Then user ${2#$.id} exists\n", NodeResult::Error)]
fn registry_backend_classifies_outcomes(#[case] body: &str, #[case] expected: NodeResult) {
    let plan = registry_plan(body);
    let factory = RegistryBackendFactory::new(registry());
    let table = PlanRunner::new(&factory)
        .run(&plan)
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(table.result(plan.id), Some(expected));
}

#[test]
fn registry_backend_records_arguments_and_errors() {
    let plan = registry_plan(
        "    Given a user named ana\n    Then user ${1#$.id} exists\n    Given it explodes\n",
    );
    let factory = RegistryBackendFactory::new(registry());
    let table = PlanRunner::new(&factory)
        .run(&plan)
        .unwrap_or_else(|error| panic!("{error}"));

    let check = table
        .get(node(&plan, "user ${1#$.id} exists").id)
        .unwrap_or_else(|| panic!("step state"));
    let [argument] = check.arguments() else {
        panic!("one argument expected");
    };
    assert_eq!(argument.raw, "${1#$.id}");
    assert_eq!(argument.value, crate::types::Value::Integer(41));
    assert_eq!(
        argument.evaluations.get("${1#$.id}").map(String::as_str),
        Some("41")
    );
    assert!(check.started_at() <= check.finished_at());

    let explosion = table
        .get(node(&plan, "it explodes").id)
        .unwrap_or_else(|| panic!("step state"));
    assert_eq!(explosion.error(), Some("boiler pressure"));
}

#[test]
fn hooks_run_around_every_test_case() {
    let set_up = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let mut builder = Registry::builder();
    let counter = Arc::clone(&set_up);
    builder
        .step("a step", |step| {
            let ready = step.context().get("ready").cloned();
            if ready == Some(json!(true)) {
                Ok(None)
            } else {
                Err(StepError::failure("set-up did not run"))
            }
        })
        .on_set_up(move |context| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let _ = context.insert("ready", json!(true));
            Ok(())
        })
        .on_tear_down(|_| Err(StepError::failure("tear-down failures are only logged")));
    let registry = Arc::new(builder.build().unwrap_or_else(|error| panic!("{error}")));
    let plan = compile(
        "Feature: Hooks\n\
         \x20 Scenario: A\n\
         \x20   Given a step\n\
         \x20 Scenario: B\n\
         \x20   Given a step\n",
    );
    let factory = RegistryBackendFactory::new(registry);
    let table = PlanRunner::new(&factory)
        .run(&plan)
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(table.result(plan.id), Some(NodeResult::Passed));
    assert_eq!(set_up.load(std::sync::atomic::Ordering::SeqCst), 2);
}
