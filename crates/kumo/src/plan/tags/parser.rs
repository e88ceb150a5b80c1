//! Recursive-descent parser over filter tokens.

use super::ast::{Expr, TagFilterError};
use super::lexer::{Token, TokenKind, tokenize};

pub(super) struct Parser {
    tokens: Vec<Token>,
    position: usize,
    end: Token,
}

impl Parser {
    pub(super) fn new(input: &str) -> Result<Self, TagFilterError> {
        Ok(Self {
            tokens: tokenize(input)?,
            position: 0,
            end: Token {
                kind: TokenKind::End,
                start: input.len(),
            },
        })
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&self.end)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    pub(super) fn parse_expression(&mut self) -> Result<Expr, TagFilterError> {
        self.parse_or()
    }

    pub(super) fn expect_end(&self) -> Result<(), TagFilterError> {
        let token = self.current();
        if token.kind == TokenKind::End {
            Ok(())
        } else {
            Err(TagFilterError::new(
                token.start,
                format!("unexpected token {}", token.describe()),
            ))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, TagFilterError> {
        self.parse_chain(&TokenKind::Or, "or", Self::parse_and, |lhs, rhs| {
            Expr::Or(Box::new(lhs), Box::new(rhs))
        })
    }

    fn parse_and(&mut self) -> Result<Expr, TagFilterError> {
        self.parse_chain(&TokenKind::And, "and", Self::parse_not, |lhs, rhs| {
            Expr::And(Box::new(lhs), Box::new(rhs))
        })
    }

    fn parse_chain(
        &mut self,
        operator: &TokenKind,
        name: &str,
        operand: fn(&mut Self) -> Result<Expr, TagFilterError>,
        build: fn(Expr, Expr) -> Expr,
    ) -> Result<Expr, TagFilterError> {
        let mut node = operand(self)?;
        while self.current().kind == *operator {
            self.advance();
            self.ensure_operand(name)?;
            let rhs = operand(self)?;
            node = build(node, rhs);
        }
        Ok(node)
    }

    fn parse_not(&mut self) -> Result<Expr, TagFilterError> {
        if self.current().kind == TokenKind::Not {
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::Not(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, TagFilterError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Tag(tag) => {
                self.advance();
                Ok(Expr::Tag(tag))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                if self.current().kind != TokenKind::RParen {
                    return Err(TagFilterError::new(token.start, "missing ')'"));
                }
                self.advance();
                Ok(expr)
            }
            TokenKind::End => Err(TagFilterError::new(token.start, "expected tag or '('")),
            _ => Err(TagFilterError::new(
                token.start,
                format!("expected tag or '(' but found {}", token.describe()),
            )),
        }
    }

    fn ensure_operand(&self, name: &str) -> Result<(), TagFilterError> {
        let token = self.current();
        match token.kind {
            TokenKind::Or | TokenKind::And | TokenKind::RParen | TokenKind::End => {
                Err(TagFilterError::new(
                    token.start,
                    format!("expected tag or '(' after '{name}'"),
                ))
            }
            _ => Ok(()),
        }
    }
}
