//! Placeholder parsing utilities used by the lexer.

use crate::errors::{PatternError, placeholder_error};

use super::lexer::Cursor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlaceholderSpec {
    pub name: Option<String>,
    pub type_name: String,
    pub start: usize,
    pub end: usize,
}

pub(crate) fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '-'
}

fn read_identifier(cursor: &mut Cursor<'_>) -> String {
    let mut ident = String::new();
    while let Some(ch) = cursor.peek() {
        if !is_identifier_char(ch) {
            break;
        }
        ident.push(ch);
        cursor.bump();
    }
    ident
}

/// Parse `{type}` or `{name:type}` with the cursor positioned on the opening
/// brace.
pub(crate) fn parse_placeholder(cursor: &mut Cursor<'_>) -> Result<PlaceholderSpec, PatternError> {
    let start = cursor.position();
    cursor.bump();
    let first = read_identifier(cursor);

    let (name, type_name) = match cursor.peek() {
        Some(':') => {
            cursor.bump();
            let type_name = read_identifier(cursor);
            if type_name.is_empty() {
                return Err(placeholder_error(
                    "invalid placeholder in step expression",
                    start,
                    Some(first),
                ));
            }
            (Some(first), type_name)
        }
        _ => (None, first),
    };

    match cursor.peek() {
        Some('}') => {
            cursor.bump();
        }
        None => {
            return Err(placeholder_error(
                "missing closing '}' for placeholder",
                start,
                Some(name.unwrap_or(type_name)),
            ));
        }
        Some(_) => {
            return Err(placeholder_error(
                "invalid placeholder in step expression",
                start,
                Some(name.unwrap_or(type_name)),
            ));
        }
    }

    Ok(PlaceholderSpec {
        name,
        type_name,
        start,
        end: cursor.position(),
    })
}

#[cfg(test)]
mod tests {
    use crate::expression::test_support::{parse_err, parse_ok};

    #[test]
    fn parses_type_only_placeholder() {
        let spec = parse_ok("{integer}");
        assert_eq!(spec.end, "{integer}".len());
        assert_eq!(spec.name, None);
        assert_eq!(spec.type_name, "integer");
    }

    #[test]
    fn parses_named_placeholder() {
        let spec = parse_ok("{count:integer-assertion}");
        assert_eq!(spec.name.as_deref(), Some("count"));
        assert_eq!(spec.type_name, "integer-assertion");
    }

    #[test]
    fn accepts_non_ascii_identifiers() {
        let spec = parse_ok("{año:integer}");
        assert_eq!(spec.name.as_deref(), Some("año"));
        assert_eq!(spec.end, "{año:integer}".len());
    }

    #[test]
    fn errors_on_missing_closing_brace() {
        let err = parse_err("{value");
        assert!(err.to_string().contains("missing closing"));
    }

    #[test]
    fn errors_on_empty_type() {
        let err = parse_err("{value:}");
        assert!(err.to_string().contains("invalid placeholder"));
    }

    #[test]
    fn errors_on_whitespace_inside_placeholder() {
        let err = parse_err("{value :integer}");
        assert!(
            err.to_string()
                .contains("invalid placeholder in step expression")
        );
    }

    #[test]
    fn errors_on_nested_braces() {
        let err = parse_err("{outer {inner}}");
        assert!(err.to_string().contains("outer"));
    }
}
