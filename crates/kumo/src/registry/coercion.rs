//! Typed arguments and the error raised when step text cannot be coerced.

use std::collections::BTreeMap;
use std::fmt;

use i18n_embed::fluent::FluentLanguageLoader;
use serde::{Serialize, Serializer};

use crate::localization::{message_with_loader, with_loader};
use crate::types::Value;

/// A value bound to a step expression placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Argument {
    /// Name given in `{name:type}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Data type the text was coerced with.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Matched text as written in the step.
    pub raw: String,
    /// Coerced value.
    #[serde(serialize_with = "serialize_value")]
    pub value: Value,
    /// Property placeholders replaced in the matched text, raw to resolved.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub evaluations: BTreeMap<String, String>,
}

fn serialize_value<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
    value.to_json().serialize(serializer)
}

/// Matched text rejected by its data type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionError {
    /// Data type named by the placeholder.
    pub type_name: String,
    /// Offending text.
    pub text: String,
    /// The type's description of valid input, in the document language.
    pub hint: String,
    /// Why the parser rejected the text.
    pub reason: String,
}

impl CoercionError {
    /// Render the error message using the provided Fluent loader.
    #[must_use]
    pub fn format_with_loader(&self, loader: &FluentLanguageLoader) -> String {
        message_with_loader(loader, "coercion-error", |args| {
            args.set("type", self.type_name.clone());
            args.set("value", self.text.clone());
            args.set("hint", self.hint.clone());
            args.set("reason", self.reason.clone());
        })
    }
}

impl fmt::Display for CoercionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&with_loader(|loader| self.format_with_loader(loader)))
    }
}

impl std::error::Error for CoercionError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn message_names_type_and_hint() {
        let error = CoercionError {
            type_name: "percent".into(),
            text: "140".into(),
            hint: "integer number between 0 and 100".into(),
            reason: "140 is outside the range 0 to 100".into(),
        };
        let message = error.to_string();
        assert!(message.contains("percent"));
        assert!(message.contains("integer number between 0 and 100"));
        assert!(message.contains("140"));
    }

    #[test]
    fn serializes_value_as_json() {
        let argument = Argument {
            name: None,
            type_name: "integer".into(),
            raw: "${count}".into(),
            value: Value::Integer(3),
            evaluations: BTreeMap::from([("${count}".into(), "3".into())]),
        };
        let rendered = serde_json::to_value(&argument).unwrap_or_else(|error| panic!("{error}"));
        assert_eq!(
            rendered,
            json!({
                "type": "integer",
                "raw": "${count}",
                "value": 3,
                "evaluations": {"${count}": "3"}
            })
        );
    }
}
