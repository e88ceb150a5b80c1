//! Syntax tree produced by the document parser.
//!
//! Nodes are plain owned data. Every node carries the 1-based location of the
//! line that introduced it so later stages can point back at the document.

use kumo_patterns::StepKeyword;
use serde::Serialize;
use std::fmt;

/// A 1-based line and column within a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number in characters, starting at 1.
    pub column: usize,
}

impl Location {
    /// Build a location from a line and column.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.line, self.column)
    }
}

/// A parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Language the keywords were read in.
    pub language: String,
    /// The feature, absent for documents holding only comments.
    pub feature: Option<Feature>,
    /// Comments not attached to any node.
    pub comments: Vec<Comment>,
}

/// A `@tag` annotation, stored with its leading `@`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag text including the `@`.
    pub name: String,
    /// Where the tag starts.
    pub location: Location,
}

/// A `#` comment line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Comment text with the `#` and surrounding whitespace removed.
    pub text: String,
    /// Where the comment starts.
    pub location: Location,
}

/// Fields shared by every titled block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Keyword as written, e.g. `Scenario Outline`.
    pub keyword: String,
    /// Title after the colon.
    pub name: String,
    /// Free text lines following the title.
    pub description: Option<String>,
    /// Tags preceding the block.
    pub tags: Vec<Tag>,
    /// Comments preceding the block.
    pub comments: Vec<Comment>,
    /// Location of the title line.
    pub location: Location,
}

/// `Feature:` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Title, tags and description.
    pub header: Header,
    /// Optional background shared by all scenarios.
    pub background: Option<Background>,
    /// Scenarios and scenario outlines in declaration order.
    pub children: Vec<ScenarioDefinition>,
}

/// `Background:` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    /// Title and description. Backgrounds carry no tags.
    pub header: Header,
    /// Steps run before every scenario.
    pub steps: Vec<Step>,
}

/// Child of a feature.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioDefinition {
    /// Plain scenario.
    Scenario(Scenario),
    /// Scenario outline with example tables.
    Outline(ScenarioOutline),
}

/// `Scenario:` block.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Title, tags and description.
    pub header: Header,
    /// Steps in order.
    pub steps: Vec<Step>,
}

/// `Scenario Outline:` block.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutline {
    /// Title, tags and template steps.
    pub scenario: Scenario,
    /// One or more example tables.
    pub examples: Vec<Examples>,
}

/// `Examples:` block under an outline.
#[derive(Debug, Clone, PartialEq)]
pub struct Examples {
    /// Title, tags and description.
    pub header: Header,
    /// Header row followed by at least one data row.
    pub table: DataTable,
}

impl Examples {
    /// Column names from the header row.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.table
            .rows
            .first()
            .map(|row| row.cells.iter().map(|cell| cell.value.as_str()).collect())
            .unwrap_or_default()
    }

    /// Data rows, excluding the header.
    pub fn rows(&self) -> impl Iterator<Item = &TableRow> {
        self.table.rows.iter().skip(1)
    }
}

/// A step line with its optional argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Keyword as written, e.g. `Étant donné que`.
    pub keyword: String,
    /// Semantic role of the keyword before conjunction resolution.
    pub keyword_kind: StepKeyword,
    /// Text after the keyword.
    pub text: String,
    /// Comments preceding the step.
    pub comments: Vec<Comment>,
    /// Location of the step line.
    pub location: Location,
    /// Attached doc string or data table.
    pub argument: Option<StepArgument>,
}

/// Block argument attached to a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepArgument {
    /// Fenced multi-line text.
    DocString(DocString),
    /// Pipe-delimited table.
    DataTable(DataTable),
}

/// Fenced multi-line text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocString {
    /// Fence used, `"""` or three backticks.
    pub delimiter: String,
    /// Content type hint written after the opening fence.
    pub media_type: Option<String>,
    /// Content with the fence indentation removed.
    pub content: String,
    /// Location of the opening fence.
    pub location: Location,
}

/// Pipe-delimited table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTable {
    /// Rows in order, all with the same number of cells.
    pub rows: Vec<TableRow>,
    /// Location of the first row.
    pub location: Location,
}

impl DataTable {
    /// Cell values as plain strings.
    #[must_use]
    pub fn values(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.cells.iter().map(|cell| cell.value.clone()).collect())
            .collect()
    }
}

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    /// Cells in order.
    pub cells: Vec<TableCell>,
    /// Location of the leading `|`.
    pub location: Location,
}

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    /// Unescaped, trimmed cell value.
    pub value: String,
    /// Location of the first character of the value.
    pub location: Location,
}
