//! Result tree snapshots.
//!
//! After a run, the plan and its [`ExecutionTable`] are combined into a
//! [`PlanNodeSnapshot`] tree mirroring the plan, with each node's status,
//! result, timing, error and arguments. Reporters serialize the snapshot
//! rather than reading the table directly, so nodes the run never visited
//! appear as `NOT_STARTED` without a result.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::execution::{ExecutionStatus, ExecutionTable, NodeResult};
use crate::plan::{NodeId, NodeKind, PlanNode, StepData};
use crate::registry::Argument;

/// JSON writer for result trees.
pub mod json;


/// Number of test cases finishing with each result.
///
/// # Examples
///
/// ```
/// use kumo::NodeResult;
/// use kumo::reporting::ResultCounts;
///
/// let mut counts = ResultCounts::default();
/// counts.add(NodeResult::Passed);
/// counts.add(NodeResult::Failed);
/// counts.add(NodeResult::Passed);
/// assert_eq!(counts.get(NodeResult::Passed), 2);
/// assert_eq!(counts.total(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultCounts(BTreeMap<&'static str, usize>);

impl ResultCounts {
    /// Count one more test case with `result`.
    pub fn add(&mut self, result: NodeResult) {
        *self.0.entry(result.as_str()).or_default() += 1;
    }

    /// Test cases counted with `result`.
    #[must_use]
    pub fn get(&self, result: NodeResult) -> usize {
        self.0.get(result.as_str()).copied().unwrap_or_default()
    }

    /// Test cases counted with any result.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    fn merge(&mut self, other: &Self) {
        for (result, count) in &other.0 {
            *self.0.entry(*result).or_default() += count;
        }
    }
}

/// A plan node with what happened to it during a run.
#[derive(Debug, Clone, Serialize)]
pub struct PlanNodeSnapshot<'p> {
    /// What the node represents.
    pub kind: NodeKind,
    /// Deterministic identifier.
    pub id: NodeId,
    /// Identifier taken from an id tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<&'p str>,
    /// Display name.
    pub name: &'p str,
    /// Keyword as written.
    pub keyword: &'p str,
    /// Document language.
    pub language: &'p str,
    /// Effective tags.
    pub tags: &'p BTreeSet<String>,
    /// Effective properties.
    pub properties: &'p BTreeMap<String, String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'p str>,
    /// Origin of the node.
    pub source: &'p str,
    /// Whether the tag filter excluded the node.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub filtered: bool,
    /// Step attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<&'p StepData>,
    /// Lifecycle position at the end of the run.
    pub status: ExecutionStatus,
    /// Outcome, once finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<NodeResult>,
    /// Start instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Finish instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    /// Elapsed milliseconds between start and finish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    /// Message explaining a non-passing result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'p str>,
    /// Arguments bound to a step.
    #[serde(skip_serializing_if = "no_arguments")]
    pub arguments: &'p [Argument],
    /// Test cases in this subtree by result.
    #[serde(skip_serializing_if = "is_leaf_count")]
    pub test_cases: ResultCounts,
    /// Children in plan order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PlanNodeSnapshot<'p>>,
}

fn is_leaf_count(counts: &ResultCounts) -> bool {
    counts.total() == 0
}

fn no_arguments(arguments: &&[Argument]) -> bool {
    arguments.is_empty()
}

impl<'p> PlanNodeSnapshot<'p> {
    /// Combine `node` and the states recorded for its subtree.
    #[must_use]
    pub fn new(node: &'p PlanNode, table: &'p ExecutionTable) -> Self {
        let state = table.get(node.id);
        let children: Vec<_> = node
            .children
            .iter()
            .map(|child| Self::new(child, table))
            .collect();
        let result = state.and_then(|state| state.result());
        let mut test_cases = ResultCounts::default();
        if node.is_test_case() {
            if let Some(result) = result {
                test_cases.add(result);
            }
        } else {
            for child in &children {
                test_cases.merge(&child.test_cases);
            }
        }
        Self {
            kind: node.kind,
            id: node.id,
            tag_id: node.tag_id.as_deref(),
            name: &node.name,
            keyword: &node.keyword,
            language: &node.language,
            tags: &node.tags,
            properties: &node.properties,
            description: node.description.as_deref(),
            source: &node.source,
            filtered: node.filtered,
            step: node.step.as_ref(),
            status: state.map_or(ExecutionStatus::NotStarted, |state| state.status()),
            result,
            started_at: state.and_then(|state| state.started_at()),
            finished_at: state.and_then(|state| state.finished_at()),
            duration_ms: state
                .and_then(|state| state.duration())
                .map(|duration| duration.num_milliseconds()),
            error: state.and_then(|state| state.error()),
            arguments: state.map(|state| state.arguments()).unwrap_or_default(),
            test_cases,
            children,
        }
    }
}

/// Test case counts for the whole plan.
///
/// # Examples
///
/// ```
/// use kumo::execution::ExecutionTable;
/// use kumo::plan::{CompileOptions, PlanCompiler};
/// use kumo::{gherkin, reporting};
///
/// let document = gherkin::parse("Feature: F\n  Scenario: S\n", "en").expect("valid");
/// let plan = PlanCompiler::new(CompileOptions::default())
///     .compile([("f.feature", &document)], &Default::default())
///     .expect("compiles");
/// let counts = reporting::summary(&plan, &ExecutionTable::new());
/// assert_eq!(counts.total(), 0);
/// ```
#[must_use]
pub fn summary(plan: &PlanNode, table: &ExecutionTable) -> ResultCounts {
    let mut counts = ResultCounts::default();
    for result in plan
        .descendants()
        .filter(|node| node.is_test_case())
        .filter_map(|node| table.result(node.id))
    {
        counts.add(result);
    }
    counts
}
