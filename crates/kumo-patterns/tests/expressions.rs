//! Behavioural tests for step-expression compilation and dialect lookup.
#![expect(clippy::expect_used, reason = "tests assert conversion paths")]

use kumo_patterns::{
    Dialect, GroupStyle, PatternError, SpecificityScore, StepKeyword, TitleKeyword,
    compile_expression, extract_named_values,
};

fn builtin(name: &str) -> Option<String> {
    match name {
        "integer" => Some(r"-?\d+".into()),
        "word" => Some(r"[^\s]+".into()),
        "text" => Some(r#""[^"]*""#.into()),
        _ => None,
    }
}

#[test]
fn compiles_and_extracts_arguments() {
    let compiled = compile_expression(
        "the user {name:text} has {integer} item(s)",
        GroupStyle::Named,
        builtin,
    )
    .expect("expression should compile");
    let regex = compiled.to_regex().expect("regex should compile");
    let groups = compiled.arguments().iter().map(|slot| slot.group.as_str());
    let values = extract_named_values(&regex, r#"the user "ann" has 1 item"#, groups)
        .expect("step text should match");
    assert_eq!(values, vec![r#""ann""#.to_string(), "1".to_string()]);
}

#[test]
fn exposes_placeholder_error_details() {
    let Err(err) = compile_expression("{value:}", GroupStyle::Named, builtin) else {
        panic!("expected placeholder error");
    };
    let PatternError::Placeholder(info) = err else {
        panic!("expected placeholder error, got {err}");
    };
    assert_eq!(info.placeholder.as_deref(), Some("value"));
    assert!(info.to_string().contains("value"));
}

#[test]
fn names_unknown_types() {
    let Err(err) = compile_expression("a {colour} car", GroupStyle::Named, builtin) else {
        panic!("expected unknown type error");
    };
    assert!(err.to_string().contains("colour"));
}

#[test]
fn alternatives_and_optionals_match_variants() {
    let compiled = compile_expression("I (really) like|love {word}", GroupStyle::Named, builtin)
        .expect("expression should compile");
    let regex = compiled.to_regex().expect("regex should compile");
    for text in ["I like tea", "I really love tea", "I love tea"] {
        assert!(regex.is_match(text), "{text:?} should match");
    }
    assert!(!regex.is_match("I hate tea"));
}

#[test]
fn specificity_prefers_literal_expression() {
    let literal = SpecificityScore::calculate("the light is red").expect("valid expression");
    let generic = SpecificityScore::calculate("the light is {word}").expect("valid expression");
    assert!(literal > generic);
}

#[test]
fn parses_localized_lines_with_dialects() {
    let es = Dialect::for_language("es").expect("spanish dialect");
    assert_eq!(
        es.match_title("Característica: Cuentas"),
        Some((TitleKeyword::Feature, "Característica", "Cuentas"))
    );
    let (keyword, _, text) = es.match_step("Entonces funciona").expect("step line");
    assert_eq!(keyword, StepKeyword::Then);
    assert_eq!(text, "funciona");
}
