//! Step keyword classification shared by the parser and the plan compiler.

use std::fmt;

/// Semantic role of a step keyword, independent of the document language.
///
/// Dialect tables map every localized keyword onto one of these variants.
/// `And` and `But` are conjunctions and take the role of the preceding primary
/// keyword once [`resolve`](Self::resolve) is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StepKeyword {
    /// Setup preconditions for a scenario.
    Given,
    /// Perform an action when testing behaviour.
    When,
    /// Assert the expected outcome of a scenario.
    Then,
    /// Additional conditions that share context with the previous step.
    And,
    /// Negative or contrasting conditions.
    But,
}

impl StepKeyword {
    /// Return the canonical English name of the keyword.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumo_patterns::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::Given.as_str(), "Given");
    /// assert_eq!(StepKeyword::And.as_str(), "And");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }

    /// Resolve conjunctions to the semantic keyword of the previous step.
    ///
    /// When the current keyword is `And` or `But`, returns the value stored in
    /// `prev`. For primary keywords (`Given`/`When`/`Then`), updates `prev` and
    /// returns the keyword unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumo_patterns::StepKeyword;
    ///
    /// let mut prev = Some(StepKeyword::Given);
    /// assert_eq!(StepKeyword::And.resolve(&mut prev), StepKeyword::Given);
    /// assert_eq!(StepKeyword::When.resolve(&mut prev), StepKeyword::When);
    /// assert_eq!(prev, Some(StepKeyword::When));
    /// ```
    #[must_use]
    pub fn resolve(self, prev: &mut Option<Self>) -> Self {
        if matches!(self, Self::And | Self::But) {
            prev.as_ref().copied().unwrap_or(Self::Given)
        } else {
            *prev = Some(self);
            self
        }
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[StepKeyword::Given, StepKeyword::And, StepKeyword::When, StepKeyword::But],
        &[StepKeyword::Given, StepKeyword::Given, StepKeyword::When, StepKeyword::When])]
    #[case(&[StepKeyword::Then, StepKeyword::And, StepKeyword::And],
        &[StepKeyword::Then, StepKeyword::Then, StepKeyword::Then])]
    fn conjunctions_follow_the_previous_primary(
        #[case] keywords: &[StepKeyword],
        #[case] expected: &[StepKeyword],
    ) {
        let mut prev = None;
        let resolved: Vec<_> = keywords.iter().map(|keyword| keyword.resolve(&mut prev)).collect();
        assert_eq!(resolved, expected);
    }

    #[test]
    fn conjunction_without_history_defaults_to_given() {
        let mut prev = None;
        assert_eq!(StepKeyword::But.resolve(&mut prev), StepKeyword::Given);
        assert_eq!(prev, None);
    }
}
