//! Test helpers for asserting expression parser outcomes.
use super::lexer::Cursor;
use super::placeholder::{PlaceholderSpec, parse_placeholder};
use crate::errors::PatternError;

pub(crate) fn parse_ok(text: &str) -> PlaceholderSpec {
    match parse_placeholder(&mut Cursor::new(text)) {
        Ok(result) => result,
        Err(err) => panic!("placeholder should parse: {err}"),
    }
}

pub(crate) fn parse_err(text: &str) -> PatternError {
    match parse_placeholder(&mut Cursor::new(text)) {
        Ok(_) => panic!("placeholder parsing should fail"),
        Err(err) => err,
    }
}
