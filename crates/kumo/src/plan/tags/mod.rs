//! Tag filter expressions.
//!
//! A filter combines tags (`@smoke`) with `not`, `and`, `or` and parentheses.
//! `not` binds tighter than `and`, which binds tighter than `or`; binary
//! operators associate to the left. Keywords are case insensitive and tags
//! are compared with their leading `@`.

mod ast;
mod lexer;
mod parser;

pub use ast::{TagFilter, TagFilterError};

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("@a", &["@a"], true)]
    #[case("@a", &["@b"], false)]
    #[case("not @a", &["@b"], true)]
    #[case("@a and @b", &["@a"], false)]
    #[case("@a or @b and @c", &["@a"], true)]
    #[case("(@a or @b) and @c", &["@a"], false)]
    #[case("@a AND NOT (@b Or @c)", &["@a", "@d"], true)]
    #[case("@a and not (@b or @c)", &["@a", "@c"], false)]
    #[case("@jira:ABC-1", &["@jira:ABC-1"], true)]
    fn evaluates_against_tag_sets(
        #[case] expression: &str,
        #[case] tags: &[&str],
        #[case] expected: bool,
    ) {
        let filter = TagFilter::parse(expression)
            .unwrap_or_else(|error| panic!("{expression} should parse: {error}"));
        assert_eq!(filter.matches(tags.iter().copied()), expected);
    }

    #[rstest]
    #[case("", 0)]
    #[case("@", 1)]
    #[case("@a and", 6)]
    #[case("(@a or @b", 0)]
    #[case("@a @b", 3)]
    #[case("@a xor @b", 3)]
    #[case("@a or or @b", 6)]
    fn reports_error_offsets(#[case] expression: &str, #[case] offset: usize) {
        let Err(error) = TagFilter::parse(expression) else {
            panic!("{expression} should be rejected");
        };
        assert_eq!(error.offset(), offset, "{error}");
    }

    #[test]
    fn displays_source_text() {
        let filter = TagFilter::parse("  @a and @b ")
            .unwrap_or_else(|error| panic!("filter parses: {error}"));
        assert_eq!(filter.to_string(), "@a and @b");
    }
}
