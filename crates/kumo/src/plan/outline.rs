//! `<column>` substitution for outline rows.

use std::borrow::Cow;
use std::sync::LazyLock;

use hashbrown::HashMap;
use regex::{Captures, Regex};

use crate::gherkin::TableRow;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([^<>\s](?:[^<>]*[^<>\s])?)>")
        .unwrap_or_else(|error| panic!("outline placeholder regex must compile: {error}"))
});

/// One data row of an examples table, keyed by column name.
pub(super) struct ExampleRow<'a> {
    values: HashMap<&'a str, &'a str>,
}

impl<'a> ExampleRow<'a> {
    pub(super) fn new(columns: &[&'a str], row: &'a TableRow) -> Self {
        let values = columns
            .iter()
            .copied()
            .zip(row.cells.iter().map(|cell| cell.value.as_str()))
            .collect();
        Self { values }
    }

    /// Replace every placeholder, failing on the first unknown column.
    pub(super) fn substitute(&self, text: &str) -> Result<String, String> {
        if let Some(missing) = PLACEHOLDER
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .find(|name| !self.values.contains_key(name.as_str()))
        {
            return Err(missing.as_str().to_string());
        }
        Ok(self.substitute_known(text).into_owned())
    }

    /// Replace placeholders naming known columns and leave the rest.
    pub(super) fn substitute_known<'t>(&self, text: &'t str) -> Cow<'t, str> {
        PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            caps.get(1)
                .and_then(|name| self.values.get(name.as_str()))
                .map_or_else(|| whole.to_string(), |value| (*value).to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gherkin::{Location, TableCell};

    fn row(values: &[&str]) -> TableRow {
        TableRow {
            cells: values
                .iter()
                .map(|value| TableCell {
                    value: (*value).to_string(),
                    location: Location::default(),
                })
                .collect(),
            location: Location::default(),
        }
    }

    #[test]
    fn substitutes_known_columns() {
        let data = row(&["3", "ann"]);
        let example = ExampleRow::new(&["count", "user name"], &data);
        assert_eq!(
            example.substitute("<user name> has <count> items"),
            Ok("ann has 3 items".to_string())
        );
    }

    #[test]
    fn reports_unknown_columns() {
        let data = row(&["3"]);
        let example = ExampleRow::new(&["count"], &data);
        assert_eq!(example.substitute("<count> and <total>"), Err("total".to_string()));
        assert_eq!(example.substitute_known("<count> and <total>"), "3 and <total>");
    }

    #[test]
    fn ignores_comparison_operators() {
        let data = row(&["3"]);
        let example = ExampleRow::new(&["count"], &data);
        assert_eq!(example.substitute("a < 3 and b > 2"), Ok("a < 3 and b > 2".to_string()));
    }
}
