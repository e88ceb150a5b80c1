//! Line classification ahead of grammar analysis.
//!
//! Every physical line is stripped of indentation and classified once. Doc
//! strings span several physical lines and are gathered into a single
//! classified line so the grammar never sees their content.

use std::sync::LazyLock;

use kumo_patterns::{Dialect, StepKeyword, TitleKeyword};
use regex::Regex;

use super::ast::{DocString, Location, TableCell, Tag};
use super::error::{ParseError, ParseErrorKind};

static LANGUAGE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*language\s*:\s*([a-zA-Z\-_]+)\s*$")
        .unwrap_or_else(|error| panic!("language directive regex must compile: {error}"))
});

const FENCES: [&str; 2] = ["\"\"\"", "```"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LineKind {
    Empty,
    Language,
    Comment(String),
    Tags(Vec<Tag>),
    Title {
        kind: TitleKeyword,
        keyword: &'static str,
        title: String,
    },
    Step {
        kind: StepKeyword,
        keyword: &'static str,
        text: String,
    },
    TableRow(Vec<TableCell>),
    DocString(DocString),
    Text(String),
}

impl LineKind {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Empty => "empty line".into(),
            Self::Language => "# language".into(),
            Self::Comment(_) => "comment".into(),
            Self::Tags(tags) => tags
                .iter()
                .map(|tag| tag.name.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            Self::Title { keyword, .. } => format!("{keyword}:"),
            Self::Step { keyword, text, .. } => format!("{keyword} {text}"),
            Self::TableRow(_) => "table row".into(),
            Self::DocString(_) => "doc string".into(),
            Self::Text(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Line {
    pub kind: LineKind,
    pub location: Location,
}

#[derive(Debug)]
pub(crate) struct Tokenized {
    pub lines: Vec<Line>,
    pub dialect: &'static Dialect,
    pub errors: Vec<ParseError>,
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|ch| ch.is_whitespace()).count()
}

fn detect_dialect(text: &str, language: &str, errors: &mut Vec<ParseError>) -> &'static Dialect {
    let mut requested = (language.to_string(), Location::new(1, 1));
    for (index, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !trimmed.starts_with('#') {
            break;
        }
        if let Some(code) = LANGUAGE_DIRECTIVE
            .captures(line)
            .and_then(|caps| caps.get(1))
        {
            requested = (
                code.as_str().to_string(),
                Location::new(index + 1, indentation(line) + 1),
            );
            break;
        }
    }
    let (code, location) = requested;
    Dialect::for_language(&code).unwrap_or_else(|| {
        errors.push(ParseError::new(
            ParseErrorKind::UnknownLanguage { language: code },
            location,
        ));
        Dialect::english()
    })
}

/// Split a tag line into tags. Text after a `#` is a trailing comment.
fn lex_tags(trimmed: &str, location: Location, errors: &mut Vec<ParseError>) -> Vec<Tag> {
    let mut tags = Vec::new();
    let mut column = location.column;
    let mut current = String::new();
    let mut start = column;
    let mut finish = |current: &mut String, start: usize, tags: &mut Vec<Tag>| {
        if current.is_empty() {
            return;
        }
        let name = std::mem::take(current);
        let at = Location::new(location.line, start);
        let well_formed = name
            .strip_prefix('@')
            .is_some_and(|rest| !rest.is_empty() && !rest.contains('@'));
        if well_formed {
            tags.push(Tag { name, location: at });
        } else {
            errors.push(ParseError::new(
                ParseErrorKind::InvalidTag { tag: name },
                at,
            ));
        }
    };
    for ch in trimmed.chars() {
        if ch.is_whitespace() {
            finish(&mut current, start, &mut tags);
        } else if ch == '#' && current.is_empty() {
            break;
        } else {
            if current.is_empty() {
                start = column;
            }
            current.push(ch);
        }
        column += 1;
    }
    finish(&mut current, start, &mut tags);
    tags
}

fn lex_table_row(trimmed: &str, location: Location) -> (Vec<TableCell>, bool) {
    let mut cells = Vec::new();
    let mut chars = trimmed.chars().skip(1);
    let mut column = location.column + 1;
    let mut value = String::new();
    let mut value_column: Option<usize> = None;
    let mut cell_start = column;
    while let Some(ch) = chars.next() {
        let this_column = column;
        column += 1;
        let pushed = match ch {
            '|' => {
                cells.push(TableCell {
                    value: std::mem::take(&mut value).trim().to_string(),
                    location: Location::new(location.line, value_column.unwrap_or(cell_start)),
                });
                value_column = None;
                cell_start = column;
                continue;
            }
            '\\' => {
                column += 1;
                match chars.next() {
                    Some('|') => "|".to_string(),
                    Some('\\') => "\\".to_string(),
                    Some('n') => "\n".to_string(),
                    Some(other) => format!("\\{other}"),
                    None => "\\".to_string(),
                }
            }
            other => other.to_string(),
        };
        if value_column.is_none() && !pushed.trim().is_empty() {
            value_column = Some(this_column);
        }
        value.push_str(&pushed);
    }
    let terminated = value.trim().is_empty();
    (cells, terminated)
}

fn unescape_fence(content: &str, fence: &str) -> String {
    let escaped: String = fence.chars().flat_map(|ch| ['\\', ch]).collect();
    content.replace(&escaped, fence)
}

fn strip_indentation(line: &str, indent: usize) -> &str {
    let mut rest = line;
    for _ in 0..indent {
        match rest.chars().next() {
            Some(ch) if ch.is_whitespace() => rest = rest.get(ch.len_utf8()..).unwrap_or_default(),
            _ => break,
        }
    }
    rest
}

pub(crate) fn tokenize(text: &str, language: &str) -> Tokenized {
    let mut errors = Vec::new();
    let dialect = detect_dialect(text, language, &mut errors);
    let mut lines = Vec::new();
    let mut physical = text.lines().enumerate();
    let mut in_header = true;

    while let Some((index, raw)) = physical.next() {
        let indent = indentation(raw);
        let location = Location::new(index + 1, indent + 1);
        let trimmed = raw.trim();
        let kind = if trimmed.is_empty() {
            LineKind::Empty
        } else if let Some(comment) = trimmed.strip_prefix('#') {
            if in_header && LANGUAGE_DIRECTIVE.is_match(raw) {
                LineKind::Language
            } else {
                LineKind::Comment(comment.trim().to_string())
            }
        } else if trimmed.starts_with('@') {
            LineKind::Tags(lex_tags(trimmed, location, &mut errors))
        } else if let Some(fence) = FENCES.into_iter().find(|fence| trimmed.starts_with(fence)) {
            let media_type = trimmed
                .get(fence.len()..)
                .map(str::trim)
                .filter(|rest| !rest.is_empty())
                .map(str::to_string);
            let mut content = Vec::new();
            let mut closed = false;
            for (_, body) in physical.by_ref() {
                if body.trim() == fence {
                    closed = true;
                    break;
                }
                content.push(unescape_fence(strip_indentation(body, indent), fence));
            }
            if !closed {
                errors.push(ParseError::new(
                    ParseErrorKind::UnterminatedDocString,
                    location,
                ));
            }
            LineKind::DocString(DocString {
                delimiter: fence.to_string(),
                media_type,
                content: content.join("\n"),
                location,
            })
        } else if trimmed.starts_with('|') {
            let (cells, terminated) = lex_table_row(trimmed, location);
            if !terminated {
                errors.push(ParseError::new(
                    ParseErrorKind::UnterminatedTableRow,
                    location,
                ));
            }
            LineKind::TableRow(cells)
        } else if let Some((kind, keyword, title)) = dialect.match_title(trimmed) {
            LineKind::Title {
                kind,
                keyword,
                title: title.to_string(),
            }
        } else if let Some((kind, keyword, text)) = dialect.match_step(trimmed) {
            LineKind::Step {
                kind,
                keyword,
                text: text.to_string(),
            }
        } else {
            LineKind::Text(trimmed.to_string())
        };
        if !matches!(kind, LineKind::Empty | LineKind::Comment(_) | LineKind::Language) {
            in_header = false;
        }
        lines.push(Line { kind, location });
    }

    Tokenized {
        lines,
        dialect,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<LineKind> {
        tokenize(text, "en")
            .lines
            .into_iter()
            .map(|line| line.kind)
            .collect()
    }

    #[test]
    fn classifies_lines() {
        let kinds = kinds("Feature: x\n  @a @b\n  Scenario: y\n    Given z\n    | a |\n  # note\n  words");
        assert!(matches!(kinds.first(), Some(LineKind::Title { kind: TitleKeyword::Feature, .. })));
        assert!(matches!(kinds.get(1), Some(LineKind::Tags(tags)) if tags.len() == 2));
        assert!(matches!(kinds.get(3), Some(LineKind::Step { kind: StepKeyword::Given, text, .. }) if text == "z"));
        assert!(matches!(kinds.get(4), Some(LineKind::TableRow(cells)) if cells.len() == 1));
        assert_eq!(kinds.get(5), Some(&LineKind::Comment("note".into())));
        assert_eq!(kinds.get(6), Some(&LineKind::Text("words".into())));
    }

    #[test]
    fn language_directive_selects_dialect() {
        let tokens = tokenize("# language: es\nCaracterística: x", "en");
        assert_eq!(tokens.dialect.language(), "es");
        assert!(tokens.errors.is_empty());
        assert_eq!(tokens.lines.first().map(|l| &l.kind), Some(&LineKind::Language));
    }

    #[test]
    fn unknown_language_is_reported_and_english_used() {
        let tokens = tokenize("# language: tlh\nFeature: x", "en");
        assert_eq!(tokens.dialect.language(), "en");
        assert!(matches!(
            tokens.errors.first().map(|e| &e.kind),
            Some(ParseErrorKind::UnknownLanguage { language }) if language == "tlh"
        ));
    }

    #[test]
    fn gathers_doc_string_with_indentation_removed() {
        let text = "    \"\"\"json\n    {\n      \"a\": \\\"\\\"\\\"\n\n    }\n    \"\"\"\nGiven x";
        let kinds = kinds(text);
        let Some(LineKind::DocString(doc)) = kinds.first() else {
            panic!("expected doc string, got {kinds:?}");
        };
        assert_eq!(doc.media_type.as_deref(), Some("json"));
        assert_eq!(doc.content, "{\n  \"a\": \"\"\"\n\n}");
        assert_eq!(kinds.len(), 2);
    }

    #[test]
    fn unterminated_doc_string_is_reported() {
        let tokens = tokenize("```\nopen", "en");
        assert!(matches!(
            tokens.errors.first().map(|e| &e.kind),
            Some(ParseErrorKind::UnterminatedDocString)
        ));
    }

    #[test]
    fn table_cells_unescape_and_record_columns() {
        let kinds = kinds("  | a\\|b | c\\nd |  \\\\ |");
        let Some(LineKind::TableRow(cells)) = kinds.first() else {
            panic!("expected table row");
        };
        let values: Vec<_> = cells.iter().map(|cell| cell.value.as_str()).collect();
        assert_eq!(values, vec!["a|b", "c\nd", "\\"]);
        assert_eq!(cells.first().map(|c| c.location.column), Some(5));
    }

    #[test]
    fn unterminated_table_row_is_reported() {
        let tokens = tokenize("| a | b", "en");
        assert!(matches!(
            tokens.errors.first().map(|e| &e.kind),
            Some(ParseErrorKind::UnterminatedTableRow)
        ));
    }

    #[test]
    fn tags_stop_at_trailing_comment_and_validate() {
        let tokens = tokenize("@ok @ # trailing", "en");
        let Some(LineKind::Tags(tags)) = tokens.lines.first().map(|l| &l.kind) else {
            panic!("expected tags");
        };
        assert_eq!(tags.len(), 1);
        assert!(matches!(
            tokens.errors.first().map(|e| &e.kind),
            Some(ParseErrorKind::InvalidTag { tag }) if tag == "@"
        ));
    }
}
