//! Expression lexer converting step expressions into semantic tokens.

use crate::errors::{PatternError, placeholder_error};

use super::placeholder::{PlaceholderSpec, is_identifier_char, parse_placeholder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(String),
    Placeholder {
        start: usize,
        name: Option<String>,
        type_name: String,
    },
    Wildcard {
        index: usize,
    },
    Optional {
        start: usize,
        text: String,
    },
    Alternatives {
        start: usize,
        options: Vec<String>,
    },
    OpenBrace {
        index: usize,
    },
    CloseBrace {
        index: usize,
    },
}

/// Character cursor over an expression that reports byte offsets.
#[derive(Debug)]
pub(crate) struct Cursor<'a> {
    source: &'a str,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn new(source: &'a str) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    pub(crate) const fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.source.get(self.position..)?.chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.source.get(self.position..)?.chars().nth(1)
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.position += ch.len_utf8();
        Some(ch)
    }
}

fn is_special(ch: char) -> bool {
    matches!(ch, '\\' | '{' | '}' | '(' | ')' | '*' | '|')
}

fn flush_literal(literal: &mut String, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}

fn take_trailing_word(literal: &mut String) -> String {
    let split = literal
        .char_indices()
        .rev()
        .find(|(_, ch)| ch.is_whitespace())
        .map_or(0, |(index, ch)| index + ch.len_utf8());
    literal.split_off(split)
}

fn read_word(cursor: &mut Cursor<'_>) -> String {
    let mut word = String::new();
    while let Some(ch) = cursor.peek() {
        if ch.is_whitespace() || is_special(ch) {
            break;
        }
        word.push(ch);
        cursor.bump();
    }
    word
}

fn lex_alternatives(
    cursor: &mut Cursor<'_>,
    literal: &mut String,
    tokens: &mut Vec<Token>,
) -> Result<(), PatternError> {
    let first = take_trailing_word(literal);
    let start = cursor.position().saturating_sub(first.len());
    if first.is_empty() {
        return Err(placeholder_error(
            "empty alternative in step expression",
            cursor.position(),
            None,
        ));
    }
    let mut options = vec![first];
    while cursor.peek() == Some('|') {
        cursor.bump();
        let option = read_word(cursor);
        if option.is_empty() {
            return Err(placeholder_error(
                "empty alternative in step expression",
                cursor.position(),
                None,
            ));
        }
        options.push(option);
    }
    flush_literal(literal, tokens);
    tokens.push(Token::Alternatives { start, options });
    Ok(())
}

fn lex_optional(cursor: &mut Cursor<'_>) -> Result<Token, PatternError> {
    let start = cursor.position();
    cursor.bump();
    if cursor.peek() == Some('!') {
        return Err(placeholder_error(
            "negated optional text is not supported in step expressions",
            start,
            None,
        ));
    }
    let mut text = String::new();
    loop {
        match cursor.bump() {
            Some(')') => break,
            Some('\\') => {
                if let Some(escaped) = cursor.bump() {
                    text.push(escaped);
                }
            }
            Some('(' | '{' | '}') => {
                return Err(placeholder_error(
                    "nested construct in optional text",
                    start,
                    None,
                ));
            }
            Some(ch) => text.push(ch),
            None => {
                return Err(placeholder_error(
                    "missing closing ')' for optional text",
                    start,
                    None,
                ));
            }
        }
    }
    if text.is_empty() {
        return Err(placeholder_error("empty optional text", start, None));
    }
    Ok(Token::Optional { start, text })
}

pub(crate) fn lex_expression(expression: &str) -> Result<Vec<Token>, PatternError> {
    let mut cursor = Cursor::new(expression);
    let mut tokens = Vec::new();
    let mut literal = String::new();

    while let Some(ch) = cursor.peek() {
        match ch {
            '\\' => {
                cursor.bump();
                literal.push(cursor.bump().unwrap_or('\\'));
            }
            '{' => {
                if cursor.peek_second() == Some('{') {
                    cursor.bump();
                    cursor.bump();
                    literal.push('{');
                    continue;
                }
                if cursor
                    .peek_second()
                    .is_some_and(|next| next != '-' && is_identifier_char(next))
                {
                    flush_literal(&mut literal, &mut tokens);
                    let PlaceholderSpec {
                        start,
                        name,
                        type_name,
                        ..
                    } = parse_placeholder(&mut cursor)?;
                    tokens.push(Token::Placeholder {
                        start,
                        name,
                        type_name,
                    });
                    continue;
                }
                flush_literal(&mut literal, &mut tokens);
                tokens.push(Token::OpenBrace {
                    index: cursor.position(),
                });
                cursor.bump();
            }
            '}' => {
                if cursor.peek_second() == Some('}') {
                    cursor.bump();
                    cursor.bump();
                    literal.push('}');
                    continue;
                }
                flush_literal(&mut literal, &mut tokens);
                tokens.push(Token::CloseBrace {
                    index: cursor.position(),
                });
                cursor.bump();
            }
            '*' => {
                flush_literal(&mut literal, &mut tokens);
                tokens.push(Token::Wildcard {
                    index: cursor.position(),
                });
                cursor.bump();
            }
            '(' => {
                flush_literal(&mut literal, &mut tokens);
                tokens.push(lex_optional(&mut cursor)?);
            }
            ')' => {
                return Err(placeholder_error(
                    "unmatched closing parenthesis in step expression",
                    cursor.position(),
                    None,
                ));
            }
            '|' => {
                lex_alternatives(&mut cursor, &mut literal, &mut tokens)?;
            }
            _ => {
                literal.push(ch);
                cursor.bump();
            }
        }
    }
    flush_literal(&mut literal, &mut tokens);
    Ok(tokens)
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests exercise lexer fallibility")]
mod tests {
    use super::*;

    #[test]
    fn lexes_literal_and_named_placeholder() {
        let tokens = lex_expression("Given {value:integer}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("Given ".into()),
                Token::Placeholder {
                    start: 6,
                    name: Some("value".into()),
                    type_name: "integer".into(),
                },
            ]
        );
    }

    #[test]
    fn recognises_doubled_braces_as_literals() {
        let tokens = lex_expression("{{outer}} {word}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("{outer} ".into()),
                Token::Placeholder {
                    start: 10,
                    name: None,
                    type_name: "word".into(),
                },
            ]
        );
    }

    #[test]
    fn records_stray_braces() {
        let tokens = lex_expression("{ literal }").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::OpenBrace { index: 0 },
                Token::Literal(" literal ".into()),
                Token::CloseBrace { index: 10 },
            ]
        );
    }

    #[test]
    fn lexes_optional_text_and_wildcard() {
        let tokens = lex_expression("apple(s) *").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("apple".into()),
                Token::Optional {
                    start: 5,
                    text: "s".into(),
                },
                Token::Literal(" ".into()),
                Token::Wildcard { index: 9 },
            ]
        );
    }

    #[test]
    fn lexes_alternatives_from_trailing_word() {
        let tokens = lex_expression("I eat|drink it").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("I ".into()),
                Token::Alternatives {
                    start: 2,
                    options: vec!["eat".into(), "drink".into()],
                },
                Token::Literal(" it".into()),
            ]
        );
    }

    #[test]
    fn keeps_multibyte_positions() {
        let tokens = lex_expression("café {word}").unwrap();
        assert_eq!(
            tokens.get(1),
            Some(&Token::Placeholder {
                start: "café ".len(),
                name: None,
                type_name: "word".into(),
            })
        );
    }

    #[test]
    fn escapes_special_characters() {
        let tokens = lex_expression(r"5 \* 3 \(approx\)").unwrap();
        assert_eq!(tokens, vec![Token::Literal("5 * 3 (approx)".into())]);
    }

    #[test]
    fn rejects_negated_optional() {
        let err = lex_expression("the (!big) dog").unwrap_err();
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn rejects_empty_alternative() {
        assert!(lex_expression("eat| it").is_err());
        assert!(lex_expression("|drink").is_err());
    }

    #[test]
    fn rejects_unterminated_optional() {
        let err = lex_expression("apple(s").unwrap_err();
        assert!(err.to_string().contains("missing closing ')'"));
    }
}
