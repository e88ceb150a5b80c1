//! Step expressions compiled for one language.

use std::sync::Arc;

use hashbrown::HashMap;
use kumo_patterns::{
    ArgumentSlot, GroupStyle, SpecificityScore, compile_expression, extract_named_values,
};
use regex::Regex;

use super::RegistryError;
use super::definition::StepDefinition;
use crate::types::DataType;

/// A text fragment captured for one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    /// Name given in `{name:type}`.
    pub name: Option<String>,
    /// Data type named by the placeholder.
    pub type_name: String,
    /// Matched text.
    pub text: String,
}

#[derive(Debug)]
pub(crate) struct CompiledStep {
    pub(crate) definition: usize,
    pub(crate) expression: String,
    pub(crate) specificity: SpecificityScore,
    regex: Regex,
    slots: Vec<ArgumentSlot>,
}

impl CompiledStep {
    fn captures(&self, text: &str) -> Option<Vec<Capture>> {
        let values = extract_named_values(
            &self.regex,
            text,
            self.slots.iter().map(|slot| slot.group.as_str()),
        )?;
        Some(
            self.slots
                .iter()
                .zip(values)
                .map(|(slot, text)| Capture {
                    name: slot.name.clone(),
                    type_name: slot.type_name.clone(),
                    text,
                })
                .collect(),
        )
    }
}

/// Every step definition compiled for one language.
#[derive(Debug)]
pub(crate) struct LocaleSteps {
    steps: Vec<CompiledStep>,
}

impl LocaleSteps {
    pub(crate) fn compile(
        language: &str,
        definitions: &[Arc<StepDefinition>],
        types: &HashMap<String, DataType>,
    ) -> Result<Self, RegistryError> {
        let steps = definitions
            .iter()
            .enumerate()
            .map(|(index, definition)| {
                let expression = definition.expression_for(language);
                let invalid = |source| RegistryError::InvalidExpression {
                    expression: expression.to_string(),
                    source,
                };
                let compiled = compile_expression(expression, GroupStyle::Named, |name| {
                    types.get(name).map(|data_type| data_type.regex(language))
                })
                .map_err(invalid)?;
                let regex = compiled.to_regex().map_err(invalid)?;
                Ok(CompiledStep {
                    definition: index,
                    expression: expression.to_string(),
                    specificity: compiled.specificity(),
                    regex,
                    slots: compiled.arguments().to_vec(),
                })
            })
            .collect::<Result<Vec<_>, RegistryError>>()?;
        log::debug!("compiled {} step expressions for '{language}'", steps.len());
        Ok(Self { steps })
    }

    /// Every step whose expression matches the whole `text`.
    pub(crate) fn candidates(&self, text: &str) -> Vec<(&CompiledStep, Vec<Capture>)> {
        self.steps
            .iter()
            .filter_map(|step| step.captures(text).map(|captures| (step, captures)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::builtin_types;

    fn types() -> HashMap<String, DataType> {
        builtin_types()
            .into_iter()
            .map(|data_type| (data_type.name().to_string(), data_type))
            .collect()
    }

    #[test]
    fn captures_typed_arguments() {
        let definitions = vec![Arc::new(StepDefinition::new(
            "I have {count:integer} {word} apple(s)",
            |_| Ok(None),
        ))];
        let steps = LocaleSteps::compile("en", &definitions, &types())
            .unwrap_or_else(|error| panic!("{error}"));
        let candidates = steps.candidates("I have 1,200 green apples");
        let [(step, captures)] = candidates.as_slice() else {
            panic!("expected one candidate, found {}", candidates.len());
        };
        assert_eq!(step.definition, 0);
        let texts: Vec<_> = captures.iter().map(|capture| capture.text.as_str()).collect();
        assert_eq!(texts, ["1,200", "green"]);
        assert_eq!(captures.first().and_then(|c| c.name.as_deref()), Some("count"));
    }

    #[test]
    fn uses_translations_for_the_language() {
        let definitions = vec![Arc::new(
            StepDefinition::new("I wait {duration}", |_| Ok(None))
                .translated("es", "espero {duration}"),
        )];
        let steps = LocaleSteps::compile("es", &definitions, &types())
            .unwrap_or_else(|error| panic!("{error}"));
        assert_eq!(steps.candidates("espero 3 segundos").len(), 1);
        assert!(steps.candidates("I wait 3 seconds").is_empty());
    }

    #[test]
    fn unresolved_properties_match_any_type() {
        let definitions = vec![Arc::new(StepDefinition::new("I wait {duration}", |_| Ok(None)))];
        let steps = LocaleSteps::compile("en", &definitions, &types())
            .unwrap_or_else(|error| panic!("{error}"));
        assert_eq!(steps.candidates("I wait ${timeout}").len(), 1);
    }
}
