//! Lowering of syntax trees into plan trees.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use hashbrown::HashMap;
use regex::Regex;

use super::error::CompileError;
use super::node::{DocStringData, NodeId, NodeKind, PlanNode, StepData};
use super::outline::ExampleRow;
use super::tags::TagFilter;
use crate::gherkin::{
    Background, Comment, Document, Feature, Header, Location, ScenarioDefinition, ScenarioOutline,
    Step, StepArgument, Tag,
};

static PROPERTY_COMMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z0-9_.\-]*)\s*:\s*(.*?)\s*$")
        .unwrap_or_else(|error| panic!("property comment regex must compile: {error}"))
});

/// Options controlling plan compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Scenarios whose tags do not satisfy this filter are excluded.
    pub tag_filter: Option<TagFilter>,
    /// Keep excluded scenarios as filtered nodes without steps.
    pub include_filtered: bool,
    id_tag_pattern: Option<Regex>,
}

impl CompileOptions {
    /// Use tags fully matching `pattern` (written without `@`) as node ids.
    ///
    /// # Errors
    ///
    /// Returns the regex error when `pattern` does not compile.
    pub fn with_id_tag_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.id_tag_pattern = Some(Regex::new(&format!("^(?:{pattern})$"))?);
        Ok(self)
    }
}

/// Compiles parsed documents into a single plan.
#[derive(Debug, Clone, Default)]
pub struct PlanCompiler {
    options: CompileOptions,
}

/// Inherited attributes flowing down the tree.
#[derive(Clone)]
struct Scope<'a> {
    path: &'a str,
    language: &'a str,
    tags: BTreeSet<String>,
    properties: BTreeMap<String, String>,
}

impl Scope<'_> {
    fn extend(&self, tags: &[Tag], comments: &[Comment]) -> Self {
        let mut scope = self.clone();
        scope.tags.extend(tags.iter().map(|tag| tag.name.clone()));
        scope.properties.extend(declared_properties(comments));
        scope
    }

    fn origin(&self, location: Location) -> String {
        format!("{}{location}", self.path)
    }
}

/// Hands out sibling ids, disambiguating repeated keys with an ordinal.
struct Siblings {
    parent: NodeId,
    seen: HashMap<String, usize>,
}

impl Siblings {
    fn new(parent: NodeId) -> Self {
        Self {
            parent,
            seen: HashMap::new(),
        }
    }

    fn next(&mut self, kind: NodeKind, tag_id: Option<&str>, name: &str) -> NodeId {
        let key = format!("{kind}:{}", tag_id.unwrap_or(name));
        let count = self.seen.entry(key.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.parent.child(&key)
        } else {
            self.parent.child(&format!("{key}#{count}"))
        }
    }
}

/// Everything needed to emit one scenario, plain or expanded.
struct ScenarioSpec<'a> {
    name: String,
    keyword: &'a str,
    description: Option<String>,
    tag_id: Option<String>,
    location: Location,
    steps: Vec<Step>,
}

fn declared_properties(comments: &[Comment]) -> impl Iterator<Item = (String, String)> + '_ {
    comments.iter().filter_map(|comment| {
        let caps = PROPERTY_COMMENT.captures(&comment.text)?;
        let key = caps.get(1)?.as_str();
        if key.eq_ignore_ascii_case("language") {
            return None;
        }
        Some((key.to_string(), caps.get(2)?.as_str().to_string()))
    })
}

fn substitute_step(step: &Step, example: &ExampleRow<'_>) -> Result<Step, String> {
    let mut expanded = step.clone();
    expanded.text = example.substitute(&step.text)?;
    match &mut expanded.argument {
        Some(StepArgument::DocString(doc)) => doc.content = example.substitute(&doc.content)?,
        Some(StepArgument::DataTable(table)) => {
            for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
                cell.value = example.substitute(&cell.value)?;
            }
        }
        None => {}
    }
    Ok(expanded)
}

impl PlanCompiler {
    /// Create a compiler with the given options.
    #[must_use]
    pub const fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Compile `(path, document)` pairs into one plan rooted at a `PLAN` node.
    ///
    /// `inherited` seeds the properties of every node.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] when an outline references a missing column or
    /// a node carries several id tags.
    pub fn compile<'a, I>(
        &self,
        documents: I,
        inherited: &BTreeMap<String, String>,
    ) -> Result<PlanNode, CompileError>
    where
        I: IntoIterator<Item = (&'a str, &'a Document)>,
    {
        let mut root = PlanNode::new(NodeKind::Plan, NodeId::root(), "plan");
        root.properties.clone_from(inherited);
        let mut siblings = Siblings::new(root.id);
        for (path, document) in documents {
            let Some(feature) = &document.feature else {
                log::debug!("document {path} has no feature");
                continue;
            };
            let scope = Scope {
                path,
                language: &document.language,
                tags: BTreeSet::new(),
                properties: inherited.clone(),
            };
            if let Some(node) = self.feature(feature, &scope, &mut siblings)? {
                root.children.push(node);
            }
        }
        log::debug!(
            "compiled plan with {} features and {} scenarios",
            root.children.len(),
            root.count(NodeKind::Scenario)
        );
        Ok(root)
    }

    fn id_tag(&self, tags: &[Tag], node: &str, origin: &str) -> Result<Option<String>, CompileError> {
        let Some(pattern) = &self.options.id_tag_pattern else {
            return Ok(None);
        };
        let mut matches: Vec<String> = tags
            .iter()
            .filter_map(|tag| tag.name.strip_prefix('@'))
            .filter(|name| pattern.is_match(name))
            .map(str::to_string)
            .collect();
        if matches.len() > 1 {
            return Err(CompileError::DuplicateIdTag {
                node: node.to_string(),
                tags: matches,
                origin: origin.to_string(),
            });
        }
        Ok(matches.pop())
    }

    fn accepts(&self, tags: &BTreeSet<String>) -> bool {
        self.options
            .tag_filter
            .as_ref()
            .is_none_or(|filter| filter.matches(tags.iter().map(String::as_str)))
    }

    fn titled_node(
        kind: NodeKind,
        id: NodeId,
        header: &Header,
        scope: &Scope<'_>,
    ) -> PlanNode {
        let mut node = PlanNode::new(kind, id, header.name.clone());
        node.keyword.clone_from(&header.keyword);
        node.language = scope.language.to_string();
        node.tags.clone_from(&scope.tags);
        node.properties.clone_from(&scope.properties);
        node.description.clone_from(&header.description);
        node.source = scope.origin(header.location);
        node
    }

    fn feature(
        &self,
        feature: &Feature,
        parent: &Scope<'_>,
        siblings: &mut Siblings,
    ) -> Result<Option<PlanNode>, CompileError> {
        let header = &feature.header;
        let scope = parent.extend(&header.tags, &header.comments);
        let tag_id = self.id_tag(&header.tags, &header.name, &scope.origin(header.location))?;
        let id = siblings.next(NodeKind::Feature, tag_id.as_deref(), &header.name);
        let mut node = Self::titled_node(NodeKind::Feature, id, header, &scope);
        node.tag_id = tag_id;
        let mut children = Siblings::new(id);
        for definition in &feature.children {
            let child = match definition {
                ScenarioDefinition::Scenario(scenario) => {
                    let header = &scenario.header;
                    let scope = scope.extend(&header.tags, &header.comments);
                    let tag_id =
                        self.id_tag(&header.tags, &header.name, &scope.origin(header.location))?;
                    let spec = ScenarioSpec {
                        name: header.name.clone(),
                        keyword: &header.keyword,
                        description: header.description.clone(),
                        tag_id,
                        location: header.location,
                        steps: scenario.steps.clone(),
                    };
                    self.scenario(spec, &scope, feature.background.as_ref(), &mut children)
                }
                ScenarioDefinition::Outline(outline) => {
                    self.outline(outline, &scope, feature.background.as_ref(), &mut children)?
                }
            };
            node.children.extend(child);
        }
        if node.children.is_empty() && !feature.children.is_empty() {
            log::debug!("feature '{}' has no remaining scenarios", header.name);
            return Ok(None);
        }
        Ok(Some(node))
    }

    fn outline(
        &self,
        outline: &ScenarioOutline,
        parent: &Scope<'_>,
        background: Option<&Background>,
        siblings: &mut Siblings,
    ) -> Result<Option<PlanNode>, CompileError> {
        let header = &outline.scenario.header;
        let scope = parent.extend(&header.tags, &header.comments);
        let tag_id = self.id_tag(&header.tags, &header.name, &scope.origin(header.location))?;
        let id = siblings.next(NodeKind::ScenarioOutline, tag_id.as_deref(), &header.name);
        let mut node = Self::titled_node(NodeKind::ScenarioOutline, id, header, &scope);
        node.tag_id.clone_from(&tag_id);
        let mut rows = Siblings::new(id);
        let mut number = 0_usize;
        for examples in &outline.examples {
            let row_scope = scope.extend(&examples.header.tags, &examples.header.comments);
            let columns = examples.columns();
            for row in examples.rows() {
                number += 1;
                let example = ExampleRow::new(&columns, row);
                let steps = outline
                    .scenario
                    .steps
                    .iter()
                    .map(|step| substitute_step(step, &example))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|column| CompileError::UnknownColumn {
                        outline: header.name.clone(),
                        column,
                        origin: row_scope.origin(examples.header.location),
                    })?;
                let spec = ScenarioSpec {
                    name: format!("{} [{number}]", example.substitute_known(&header.name)),
                    keyword: &header.keyword,
                    description: header
                        .description
                        .as_deref()
                        .map(|text| example.substitute_known(text).into_owned()),
                    tag_id: tag_id.as_ref().map(|base| format!("{base}_{number}")),
                    location: row.location,
                    steps,
                };
                node.children
                    .extend(self.scenario(spec, &row_scope, background, &mut rows));
            }
        }
        if node.children.is_empty() {
            log::debug!("scenario outline '{}' has no remaining rows", header.name);
            return Ok(None);
        }
        Ok(Some(node))
    }

    fn scenario(
        &self,
        spec: ScenarioSpec<'_>,
        scope: &Scope<'_>,
        background: Option<&Background>,
        siblings: &mut Siblings,
    ) -> Option<PlanNode> {
        let id = siblings.next(NodeKind::Scenario, spec.tag_id.as_deref(), &spec.name);
        let mut node = PlanNode::new(NodeKind::Scenario, id, spec.name);
        node.keyword = spec.keyword.to_string();
        node.language = scope.language.to_string();
        node.tags.clone_from(&scope.tags);
        node.properties.clone_from(&scope.properties);
        node.description = spec.description;
        node.source = scope.origin(spec.location);
        node.tag_id = spec.tag_id;

        if !self.accepts(&node.tags) {
            log::debug!("scenario '{}' excluded by tag filter", node.name);
            if !self.options.include_filtered {
                return None;
            }
            node.filtered = true;
            return Some(node);
        }

        let mut children = Siblings::new(id);
        if let Some(background) = background {
            let header = &background.header;
            let background_id = children.next(NodeKind::Background, None, &header.name);
            let mut copy = Self::titled_node(NodeKind::Background, background_id, header, scope);
            copy.tags.clone_from(&node.tags);
            copy.children = Self::steps(&background.steps, background_id, scope);
            node.children.push(copy);
        }
        node.children.extend(Self::steps(&spec.steps, id, scope));
        if let Some(base) = node.tag_id.clone() {
            identify_steps(&mut node.children, &base);
        }
        Some(node)
    }

    fn steps(steps: &[Step], parent: NodeId, scope: &Scope<'_>) -> Vec<PlanNode> {
        let mut siblings = Siblings::new(parent);
        let mut previous = None;
        steps
            .iter()
            .map(|step| {
                let id = siblings.next(NodeKind::Step, None, &step.text);
                let mut node = PlanNode::new(NodeKind::Step, id, step.text.clone());
                node.keyword.clone_from(&step.keyword);
                node.language = scope.language.to_string();
                node.tags.clone_from(&scope.tags);
                node.properties.clone_from(&scope.properties);
                node.properties.extend(declared_properties(&step.comments));
                node.source = scope.origin(step.location);
                let (doc_string, data_table) = match &step.argument {
                    Some(StepArgument::DocString(doc)) => (
                        Some(DocStringData {
                            media_type: doc.media_type.clone(),
                            content: doc.content.clone(),
                        }),
                        None,
                    ),
                    Some(StepArgument::DataTable(table)) => (None, Some(table.values())),
                    None => (None, None),
                };
                node.step = Some(StepData {
                    keyword_kind: step.keyword_kind.resolve(&mut previous),
                    doc_string,
                    data_table,
                });
                node
            })
            .collect()
    }
}

/// Name the steps of an identified test case `<id>-<n>` in run order, the
/// background steps first.
fn identify_steps(children: &mut [PlanNode], base: &str) {
    let mut number = 0_usize;
    let mut identify = |step: &mut PlanNode| {
        number += 1;
        step.tag_id = Some(format!("{base}-{number}"));
    };
    for child in children {
        if child.kind == NodeKind::Background {
            child
                .children
                .iter_mut()
                .filter(|node| node.kind == NodeKind::Step)
                .for_each(&mut identify);
        } else if child.kind == NodeKind::Step {
            identify(child);
        }
    }
}
