//! Convert lexed tokens into anchored regular-expression sources.

use crate::errors::{PatternError, placeholder_error};
use crate::specificity::SpecificityScore;

use super::lexer::{Token, lex_expression};
use super::{ArgumentSlot, CompiledExpression, GroupStyle};

fn argument_group(style: GroupStyle, group: &str, type_regex: &str) -> String {
    match style {
        GroupStyle::Named => format!("(?P<{group}>{type_regex})"),
        GroupStyle::NonCapturing => format!("(?:{type_regex})"),
    }
}

/// Compile a step expression into an anchored regular-expression source.
///
/// `type_regex` maps a data type name to the regular expression recognizing
/// its values. Each placeholder becomes one argument group named `arg0`,
/// `arg1`, ... in declaration order when `style` is [`GroupStyle::Named`].
///
/// # Errors
/// Returns [`PatternError`] when the expression is malformed, when braces are
/// unbalanced, or when a placeholder names a type `type_regex` does not know.
///
/// # Examples
/// ```
/// use kumo_patterns::{GroupStyle, compile_expression};
/// let compiled = compile_expression("I have {count:integer} apple(s)", GroupStyle::Named, |name| {
///     (name == "integer").then(|| r"\d+".to_string())
/// })
/// .expect("expression compiles");
/// assert_eq!(compiled.source(), r"^I have (?P<arg0>\d+) apple(?:s)?$");
/// assert_eq!(compiled.arguments()[0].name.as_deref(), Some("count"));
/// ```
pub fn compile_expression<F>(
    expression: &str,
    style: GroupStyle,
    mut type_regex: F,
) -> Result<CompiledExpression, PatternError>
where
    F: FnMut(&str) -> Option<String>,
{
    let tokens = lex_expression(expression)?;
    let specificity = SpecificityScore::from_tokens(&tokens);
    let mut source = String::with_capacity(expression.len().saturating_mul(2) + 2);
    source.push('^');
    let mut arguments = Vec::new();
    let mut stray_depth = 0usize;
    let mut previous_trailing_space = false;
    let mut skip_leading_space = false;
    let mut tokens = tokens.into_iter().peekable();

    while let Some(token) = tokens.next() {
        let mut trailing_space = false;
        match token {
            Token::Literal(text) => {
                let literal = if std::mem::take(&mut skip_leading_space) {
                    text.strip_prefix(' ').unwrap_or(text.as_str())
                } else {
                    text.as_str()
                };
                trailing_space = literal.ends_with(' ');
                source.push_str(&regex::escape(literal));
            }
            Token::Placeholder {
                start,
                name,
                type_name,
            } => {
                let Some(pattern) = type_regex(&type_name) else {
                    return Err(PatternError::UnknownType {
                        type_name,
                        position: start,
                    });
                };
                let group = format!("arg{}", arguments.len());
                source.push_str(&argument_group(style, &group, &pattern));
                arguments.push(ArgumentSlot {
                    name,
                    type_name,
                    group,
                });
            }
            Token::Wildcard { .. } => source.push_str(".*"),
            Token::Optional { text, .. } => {
                let escaped = regex::escape(&text);
                if previous_trailing_space {
                    source.pop();
                    source.push_str(&format!("(?: {escaped})?"));
                } else if matches!(tokens.peek(), Some(Token::Literal(next)) if next.starts_with(' '))
                {
                    source.push_str(&format!("(?:{escaped} )?"));
                    skip_leading_space = true;
                } else {
                    source.push_str(&format!("(?:{escaped})?"));
                }
            }
            Token::Alternatives { options, .. } => {
                let escaped: Vec<String> = options.iter().map(|o| regex::escape(o)).collect();
                source.push_str(&format!("(?:{})", escaped.join("|")));
            }
            Token::OpenBrace { .. } => {
                stray_depth = stray_depth.saturating_add(1);
                source.push_str(&regex::escape("{"));
            }
            Token::CloseBrace { index } => {
                if stray_depth == 0 {
                    return Err(placeholder_error(
                        "unmatched closing brace '}' in step expression",
                        index,
                        None,
                    ));
                }
                stray_depth -= 1;
                source.push_str(&regex::escape("}"));
            }
        }
        previous_trailing_space = trailing_space;
    }

    if stray_depth != 0 {
        return Err(placeholder_error(
            "unbalanced braces in step expression",
            expression.len(),
            None,
        ));
    }

    source.push('$');
    Ok(CompiledExpression {
        expression: expression.to_string(),
        source,
        arguments,
        specificity,
    })
}
