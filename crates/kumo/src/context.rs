//! Per test case state shared by lifecycle hooks and step handlers.
//! `ScenarioContext` stores named JSON values that hooks and steps exchange,
//! plus the ordered record of step results that back-reference properties
//! such as `${-1#$.id}` read from. A fresh context is created for every test
//! case and dropped when its tear-down hooks have run.

use hashbrown::HashMap;
use serde::Serialize;

/// Value returned by a finished step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// Identifier tag of the step, when it carries one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<String>,
    /// Step name after property resolution.
    pub name: String,
    /// Value returned by the handler, `null` when it returned nothing.
    pub value: serde_json::Value,
}

/// State scoped to one test case.
///
/// # Examples
///
/// ```
/// use kumo::ScenarioContext;
/// use serde_json::json;
///
/// let mut ctx = ScenarioContext::new();
/// ctx.insert("user", json!({"name": "ana"}));
/// assert_eq!(ctx.get("user"), Some(&json!({"name": "ana"})));
/// assert!(ctx.results().is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct ScenarioContext {
    values: HashMap<String, serde_json::Value>,
    results: Vec<StepRecord>,
}

impl ScenarioContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a named value, returning the one it replaces.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.values.insert(key.into(), value)
    }

    /// Retrieve a named value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Remove a named value.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }

    /// Results of the steps finished so far, in execution order.
    #[must_use]
    pub fn results(&self) -> &[StepRecord] {
        &self.results
    }

    pub(crate) fn record(&mut self, record: StepRecord) {
        self.results.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_returns_previous_value() {
        let mut ctx = ScenarioContext::new();
        assert_eq!(ctx.insert("count", json!(1)), None);
        assert_eq!(ctx.insert("count", json!(2)), Some(json!(1)));
        assert_eq!(ctx.remove("count"), Some(json!(2)));
        assert_eq!(ctx.get("count"), None);
    }

    #[test]
    fn records_results_in_order() {
        let mut ctx = ScenarioContext::new();
        for (index, name) in ["first", "second"].into_iter().enumerate() {
            ctx.record(StepRecord {
                tag_id: None,
                name: name.to_string(),
                value: json!(index),
            });
        }
        let names: Vec<_> = ctx.results().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
    }
}
