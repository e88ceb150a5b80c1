//! Splits a filter into tags, keywords and parentheses.
//!
//! Tags keep their leading `@` and extend to the next whitespace or
//! parenthesis, so tags such as `@jira:ABC-1` survive intact.

use std::iter::Peekable;
use std::str::CharIndices;

use super::ast::TagFilterError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum TokenKind {
    Tag(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
    End,
}

#[derive(Clone, Debug)]
pub(super) struct Token {
    pub(super) kind: TokenKind,
    pub(super) start: usize,
}

impl Token {
    pub(super) fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Tag(tag) => tag.clone(),
            TokenKind::And => "'and'".into(),
            TokenKind::Or => "'or'".into(),
            TokenKind::Not => "'not'".into(),
            TokenKind::LParen => "'('".into(),
            TokenKind::RParen => "')'".into(),
            TokenKind::End => "<end>".into(),
        }
    }
}

fn is_tag_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '(' | ')' | '@')
}

fn take_while(
    chars: &mut Peekable<CharIndices<'_>>,
    input: &str,
    start: usize,
    keep: impl Fn(char) -> bool,
) -> String {
    let mut end = start;
    while let Some(&(index, ch)) = chars.peek() {
        if !keep(ch) {
            break;
        }
        end = index + ch.len_utf8();
        chars.next();
    }
    input.get(start..end).unwrap_or_default().to_string()
}

/// Tokenise the whole input, ending with [`TokenKind::End`].
pub(super) fn tokenize(input: &str) -> Result<Vec<Token>, TagFilterError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        let kind = match ch {
            c if c.is_whitespace() => continue,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '@' => {
                let name = take_while(&mut chars, input, start + 1, is_tag_char);
                if name.is_empty() {
                    return Err(TagFilterError::new(
                        start + 1,
                        "expected tag name after '@'",
                    ));
                }
                TokenKind::Tag(format!("@{name}"))
            }
            c if c.is_alphabetic() => {
                let rest = take_while(&mut chars, input, start + c.len_utf8(), char::is_alphabetic);
                let word = format!("{c}{rest}");
                match word.to_lowercase().as_str() {
                    "and" => TokenKind::And,
                    "or" => TokenKind::Or,
                    "not" => TokenKind::Not,
                    _ => {
                        return Err(TagFilterError::new(
                            start,
                            format!("unexpected identifier '{word}'"),
                        ));
                    }
                }
            }
            other => {
                return Err(TagFilterError::new(
                    start,
                    format!("unexpected character '{other}'"),
                ));
            }
        };
        tokens.push(Token { kind, start });
    }
    tokens.push(Token {
        kind: TokenKind::End,
        start: input.len(),
    });
    Ok(tokens)
}
