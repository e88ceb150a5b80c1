//! Grammar analysis over classified lines.
//!
//! The parser is a small recursive state machine. It never stops at the first
//! problem: each error is recorded and parsing resumes at the next line the
//! current state recognises, so one pass reports every structural issue.

use std::iter::Peekable;
use std::vec::IntoIter;

use kumo_patterns::TitleKeyword;

use super::ast::{
    Background, Comment, DataTable, Document, Examples, Feature, Header, Location, Scenario,
    ScenarioDefinition, ScenarioOutline, Step, StepArgument, Tag, TableRow,
};
use super::error::{ParseError, ParseErrorKind, ParseErrors};
use super::lexer::{Line, LineKind, tokenize};

/// Shape of the next significant line, computed before consuming it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Peeked {
    End,
    Trivia,
    Title(TitleKeyword),
    Step,
    Other,
}

struct Parser {
    lines: Peekable<IntoIter<Line>>,
    errors: Vec<ParseError>,
    pending_tags: Vec<Tag>,
    pending_comments: Vec<Comment>,
}

impl Parser {
    fn peek(&mut self) -> Peeked {
        match self.lines.peek().map(|line| &line.kind) {
            None => Peeked::End,
            Some(
                LineKind::Empty | LineKind::Language | LineKind::Comment(_) | LineKind::Tags(_),
            ) => Peeked::Trivia,
            Some(LineKind::Title { kind, .. }) => Peeked::Title(*kind),
            Some(LineKind::Step { .. }) => Peeked::Step,
            Some(_) => Peeked::Other,
        }
    }

    fn error(&mut self, kind: ParseErrorKind, location: Location) {
        self.errors.push(ParseError::new(kind, location));
    }

    fn unexpected(&mut self, expected: &'static str) {
        if let Some(line) = self.lines.next() {
            self.error(
                ParseErrorKind::UnexpectedLine {
                    found: line.kind.describe(),
                    expected,
                },
                line.location,
            );
        }
    }

    /// Consume blank lines, comments and tag lines into the pending buffers.
    fn skip_trivia(&mut self) {
        while self.peek() == Peeked::Trivia {
            let Some(line) = self.lines.next() else { break };
            match line.kind {
                LineKind::Comment(text) => self.pending_comments.push(Comment {
                    text,
                    location: line.location,
                }),
                LineKind::Tags(tags) => self.pending_tags.extend(tags),
                _ => {}
            }
        }
    }

    /// Report and discard pending tags in a position that cannot carry them.
    fn reject_tags(&mut self) {
        if let Some(first) = self.pending_tags.first() {
            let location = first.location;
            self.error(ParseErrorKind::TagsNotAllowed, location);
        }
        self.pending_tags.clear();
    }

    fn description(&mut self) -> Option<String> {
        let mut lines: Vec<String> = Vec::new();
        while let Some(line) = self.lines.peek() {
            match &line.kind {
                LineKind::Text(text) => lines.push(text.clone()),
                LineKind::Empty if !lines.is_empty() => lines.push(String::new()),
                _ => break,
            }
            self.lines.next();
        }
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }

    /// Consume a title line and build its header from pending trivia.
    fn header(&mut self) -> Option<(TitleKeyword, Header)> {
        let line = self.lines.next()?;
        let LineKind::Title {
            kind,
            keyword,
            title,
        } = line.kind
        else {
            return None;
        };
        let tags = std::mem::take(&mut self.pending_tags);
        let comments = std::mem::take(&mut self.pending_comments);
        let description = self.description();
        Some((
            kind,
            Header {
                keyword: keyword.to_string(),
                name: title,
                description,
                tags,
                comments,
                location: line.location,
            },
        ))
    }

    fn data_table(&mut self) -> Option<DataTable> {
        let mut rows: Vec<TableRow> = Vec::new();
        while let Some(line) = self.lines.next_if(|line| matches!(line.kind, LineKind::TableRow(_))) {
            let LineKind::TableRow(cells) = line.kind else {
                continue;
            };
            if let Some(expected) = rows.first().map(|row| row.cells.len()) {
                if expected != cells.len() {
                    self.error(
                        ParseErrorKind::InconsistentCells {
                            expected,
                            found: cells.len(),
                        },
                        line.location,
                    );
                }
            }
            rows.push(TableRow {
                cells,
                location: line.location,
            });
        }
        let location = rows.first()?.location;
        Some(DataTable { rows, location })
    }

    fn steps(&mut self) -> Vec<Step> {
        let mut steps = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Peeked::Step => {}
                Peeked::Other => {
                    self.unexpected("step");
                    continue;
                }
                _ => break,
            }
            self.reject_tags();
            let Some(line) = self.lines.next() else { break };
            let LineKind::Step {
                kind,
                keyword,
                text,
            } = line.kind
            else {
                continue;
            };
            let argument = match self.lines.peek().map(|next| &next.kind) {
                Some(LineKind::DocString(_)) => match self.lines.next().map(|next| next.kind) {
                    Some(LineKind::DocString(doc)) => Some(StepArgument::DocString(doc)),
                    _ => None,
                },
                Some(LineKind::TableRow(_)) => self.data_table().map(StepArgument::DataTable),
                _ => None,
            };
            steps.push(Step {
                keyword: keyword.to_string(),
                keyword_kind: kind,
                text,
                comments: std::mem::take(&mut self.pending_comments),
                location: line.location,
                argument,
            });
        }
        steps
    }

    fn examples(&mut self) -> Option<Examples> {
        let (_, header) = self.header()?;
        self.skip_trivia();
        let table = match self.data_table() {
            Some(table) if table.rows.len() >= 2 => table,
            other => {
                self.error(ParseErrorKind::IncompleteExamples, header.location);
                other.unwrap_or(DataTable {
                    rows: Vec::new(),
                    location: header.location,
                })
            }
        };
        Some(Examples { header, table })
    }

    fn scenario_definition(&mut self) -> Option<ScenarioDefinition> {
        let (kind, header) = self.header()?;
        let steps = self.steps();
        let mut examples = Vec::new();
        loop {
            self.skip_trivia();
            if self.peek() != Peeked::Title(TitleKeyword::Examples) {
                break;
            }
            if let Some(block) = self.examples() {
                examples.push(block);
            }
        }
        let scenario = Scenario { header, steps };
        if kind == TitleKeyword::Scenario {
            if let Some(first) = examples.first() {
                self.error(
                    ParseErrorKind::ExamplesOutsideOutline,
                    first.header.location,
                );
            }
            return Some(ScenarioDefinition::Scenario(scenario));
        }
        if examples.is_empty() {
            self.error(ParseErrorKind::MissingExamples, scenario.header.location);
        }
        Some(ScenarioDefinition::Outline(ScenarioOutline { scenario, examples }))
    }

    fn background(&mut self) -> Option<Background> {
        self.reject_tags();
        let (_, header) = self.header()?;
        let steps = self.steps();
        Some(Background { header, steps })
    }

    fn feature(&mut self) -> Option<Feature> {
        let (_, header) = self.header()?;
        let mut background: Option<Background> = None;
        let mut children = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                Peeked::End | Peeked::Title(TitleKeyword::Feature) => break,
                Peeked::Title(TitleKeyword::Background) => {
                    let location = self.lines.peek().map(|line| line.location);
                    let Some(parsed) = self.background() else { break };
                    let location = location.unwrap_or_default();
                    if background.is_some() {
                        self.error(ParseErrorKind::DuplicateBackground, location);
                    } else if !children.is_empty() {
                        self.error(ParseErrorKind::MisplacedBackground, location);
                    } else {
                        background = Some(parsed);
                    }
                }
                Peeked::Title(TitleKeyword::Scenario | TitleKeyword::ScenarioOutline) => {
                    if let Some(child) = self.scenario_definition() {
                        children.push(child);
                    }
                }
                Peeked::Title(TitleKeyword::Examples) => {
                    let location = self.lines.peek().map(|line| line.location);
                    self.pending_tags.clear();
                    self.examples();
                    self.error(
                        ParseErrorKind::ExamplesOutsideOutline,
                        location.unwrap_or_default(),
                    );
                }
                Peeked::Step | Peeked::Other | Peeked::Trivia => {
                    self.unexpected("Background, Scenario or Scenario Outline");
                }
            }
        }
        Some(Feature {
            header,
            background,
            children,
        })
    }

    fn document(mut self, language: String) -> Result<Document, ParseErrors> {
        let mut feature: Option<Feature> = None;
        loop {
            self.skip_trivia();
            match self.peek() {
                Peeked::End => break,
                Peeked::Title(TitleKeyword::Feature) => {
                    let location = self.lines.peek().map(|line| line.location);
                    let parsed = self.feature();
                    if feature.is_some() {
                        self.error(
                            ParseErrorKind::DuplicateFeature,
                            location.unwrap_or_default(),
                        );
                    } else {
                        feature = parsed;
                    }
                }
                _ => self.unexpected("Feature"),
            }
        }
        self.reject_tags();
        if !self.errors.is_empty() {
            self.errors.sort_by_key(|error| error.location);
            return Err(ParseErrors::from(self.errors));
        }
        Ok(Document {
            language,
            feature,
            comments: self.pending_comments,
        })
    }
}

/// Parse a document, collecting every structural error found.
pub(crate) fn parse_document(text: &str, language: &str) -> Result<Document, ParseErrors> {
    let tokens = tokenize(text, language);
    let parser = Parser {
        lines: tokens.lines.into_iter().peekable(),
        errors: tokens.errors,
        pending_tags: Vec::new(),
        pending_comments: Vec::new(),
    };
    parser.document(tokens.dialect.language().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn kinds(text: &str) -> Vec<ParseErrorKind> {
        match parse_document(text, "en") {
            Ok(document) => panic!("expected errors, parsed {document:?}"),
            Err(errors) => errors.into_iter().map(|error| error.kind).collect(),
        }
    }

    #[test]
    fn description_lines_are_joined() {
        let document = parse_document(
            "Feature: f\n  first line\n\n  second line\n\n  Scenario: s\n    Given x",
            "en",
        )
        .unwrap_or_else(|errors| panic!("{errors}"));
        let feature = document.feature.unwrap_or_else(|| panic!("feature"));
        assert_eq!(
            feature.header.description.as_deref(),
            Some("first line\n\nsecond line")
        );
    }

    #[rstest]
    #[case::duplicate_feature("Feature: a\nFeature: b", ParseErrorKind::DuplicateFeature)]
    #[case::duplicate_background(
        "Feature: a\nBackground:\nBackground:",
        ParseErrorKind::DuplicateBackground
    )]
    #[case::misplaced_background(
        "Feature: a\nScenario: s\nBackground:",
        ParseErrorKind::MisplacedBackground
    )]
    #[case::tagged_background("Feature: a\n@t\nBackground:", ParseErrorKind::TagsNotAllowed)]
    #[case::tagged_step("Feature: a\nScenario: s\n@t\nGiven x", ParseErrorKind::TagsNotAllowed)]
    #[case::missing_examples(
        "Feature: a\nScenario Outline: s\nGiven <x>",
        ParseErrorKind::MissingExamples
    )]
    #[case::header_only_examples(
        "Feature: a\nScenario Outline: s\nGiven <x>\nExamples:\n| x |",
        ParseErrorKind::IncompleteExamples
    )]
    #[case::examples_under_scenario(
        "Feature: a\nScenario: s\nGiven x\nExamples:\n| x |\n| 1 |",
        ParseErrorKind::ExamplesOutsideOutline
    )]
    fn reports_structural_errors(#[case] text: &str, #[case] expected: ParseErrorKind) {
        assert!(kinds(text).contains(&expected));
    }

    #[test]
    fn collects_several_errors_in_one_pass() {
        let kinds = kinds(
            "Feature: a\n  Scenario: s\n    Given x\n      | a | b |\n      | c |\n    loose text\n  Scenario Outline: o\n    Given <x>\n",
        );
        assert_eq!(kinds.len(), 3, "{kinds:?}");
        assert!(matches!(
            kinds.first(),
            Some(ParseErrorKind::InconsistentCells { expected: 2, found: 1 })
        ));
        assert!(matches!(kinds.get(1), Some(ParseErrorKind::UnexpectedLine { .. })));
        assert!(matches!(kinds.get(2), Some(ParseErrorKind::MissingExamples)));
    }

    #[test]
    fn comments_attach_to_the_next_node() {
        let document = parse_document(
            "# owner: qa\nFeature: f\n  # priority: high\n  Scenario: s\n    # note\n    Given x\n# trailing",
            "en",
        )
        .unwrap_or_else(|errors| panic!("{errors}"));
        let feature = document.feature.unwrap_or_else(|| panic!("feature"));
        assert_eq!(feature.header.comments.len(), 1);
        let Some(ScenarioDefinition::Scenario(scenario)) = feature.children.first() else {
            panic!("scenario");
        };
        assert_eq!(
            scenario.header.comments.first().map(|c| c.text.as_str()),
            Some("priority: high")
        );
        assert_eq!(scenario.steps.first().map(|s| s.comments.len()), Some(1));
        assert_eq!(document.comments.len(), 1);
    }
}
