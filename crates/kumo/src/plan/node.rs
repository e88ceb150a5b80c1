//! Plan node data.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use kumo_patterns::StepKeyword;
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// Kind of a plan node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// The root of a compiled plan.
    Plan,
    /// One document.
    Feature,
    /// Copy of the feature background inside a scenario.
    Background,
    /// A test case.
    Scenario,
    /// Groups the scenarios expanded from one outline.
    ScenarioOutline,
    /// A single step.
    Step,
}

impl NodeKind {
    /// Upper-case name used in identifiers and reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plan => "PLAN",
            Self::Feature => "FEATURE",
            Self::Background => "BACKGROUND",
            Self::Scenario => "SCENARIO",
            Self::ScenarioOutline => "SCENARIO_OUTLINE",
            Self::Step => "STEP",
        }
    }

    /// Whether the node executes as a step of its scenario.
    #[must_use]
    pub const fn is_step_like(self) -> bool {
        matches!(self, Self::Step | Self::Background)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deterministic node identifier.
///
/// Identifiers are name-based UUIDs chained from the parent identifier, so
/// compiling the same documents twice yields the same identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Identifier of every plan root.
    #[must_use]
    pub fn root() -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, b"kumo"))
    }

    /// Identifier of a child derived from this node and a sibling-unique key.
    #[must_use]
    pub fn child(&self, key: &str) -> Self {
        Self(Uuid::new_v5(&self.0, key.as_bytes()))
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Doc string attached to a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocStringData {
    /// Content type written after the opening fence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Text between the fences.
    pub content: String,
}

/// Step-only attributes of a plan node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepData {
    /// Keyword role after conjunctions are resolved.
    #[serde(serialize_with = "serialize_keyword")]
    pub keyword_kind: StepKeyword,
    /// Attached doc string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_string: Option<DocStringData>,
    /// Attached data table as plain cell values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_table: Option<Vec<Vec<String>>>,
}

fn serialize_keyword<S: Serializer>(keyword: &StepKeyword, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(keyword.as_str())
}

/// A node of the executable plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanNode {
    /// What the node represents.
    pub kind: NodeKind,
    /// Deterministic identifier.
    pub id: NodeId,
    /// Identifier taken from an id tag, if one is configured and present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<String>,
    /// Display name; the step text for steps.
    pub name: String,
    /// Keyword as written in the document.
    pub keyword: String,
    /// Document language.
    pub language: String,
    /// Effective tags, each with a leading `@`.
    pub tags: BTreeSet<String>,
    /// Effective properties, inherited and declared.
    pub properties: BTreeMap<String, String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `path[line,column]` of the originating line.
    pub source: String,
    /// Whether the tag filter excluded the node. Filtered nodes have no children.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub filtered: bool,
    /// Step attributes, present on `STEP` nodes only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<StepData>,
    /// Children in declaration order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PlanNode>,
}

impl PlanNode {
    pub(crate) fn new(kind: NodeKind, id: NodeId, name: impl Into<String>) -> Self {
        Self {
            kind,
            id,
            tag_id: None,
            name: name.into(),
            keyword: String::new(),
            language: String::new(),
            tags: BTreeSet::new(),
            properties: BTreeMap::new(),
            description: None,
            source: String::new(),
            filtered: false,
            step: None,
            children: Vec::new(),
        }
    }

    /// Depth-first, pre-order traversal of this node and its descendants.
    pub fn descendants(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }

    /// Find a node by identifier.
    #[must_use]
    pub fn find(&self, id: NodeId) -> Option<&Self> {
        self.descendants().find(|node| node.id == id)
    }

    /// Number of nodes of `kind` in this subtree.
    #[must_use]
    pub fn count(&self, kind: NodeKind) -> usize {
        self.descendants().filter(|node| node.kind == kind).count()
    }

    /// Whether the node is a test case boundary.
    #[must_use]
    pub fn is_test_case(&self) -> bool {
        self.kind == NodeKind::Scenario
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_ids_are_stable_and_distinct() {
        let root = NodeId::root();
        assert_eq!(root.child("FEATURE:a"), root.child("FEATURE:a"));
        assert_ne!(root.child("FEATURE:a"), root.child("FEATURE:b"));
        assert_eq!(root, NodeId::root());
    }

    #[test]
    fn traverses_in_pre_order() {
        let root_id = NodeId::root();
        let mut root = PlanNode::new(NodeKind::Plan, root_id, "plan");
        let mut feature = PlanNode::new(NodeKind::Feature, root_id.child("f"), "f");
        feature
            .children
            .push(PlanNode::new(NodeKind::Scenario, root_id.child("s"), "s"));
        root.children.push(feature);
        root.children
            .push(PlanNode::new(NodeKind::Feature, root_id.child("g"), "g"));
        let names: Vec<_> = root.descendants().map(|node| node.name.as_str()).collect();
        assert_eq!(names, vec!["plan", "f", "s", "g"]);
        assert_eq!(root.count(NodeKind::Feature), 2);
    }
}
