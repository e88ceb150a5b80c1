//! Node outcomes and the order used to aggregate them.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::localization;

/// Outcome of a finished node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeResult {
    /// Everything succeeded.
    Passed,
    /// A test case declares no steps.
    NotImplemented,
    /// Not run, because it was filtered, asked to skip, or followed a
    /// failure.
    Skipped,
    /// No step definition matches the step text.
    Undefined,
    /// The step could not be run or failed unexpectedly.
    Error,
    /// An assertion did not hold.
    Failed,
}

impl NodeResult {
    /// Every result, in the default severity order.
    pub const ALL: [Self; 6] = [
        Self::Passed,
        Self::NotImplemented,
        Self::Skipped,
        Self::Undefined,
        Self::Error,
        Self::Failed,
    ];

    /// Canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::NotImplemented => "NOT_IMPLEMENTED",
            Self::Skipped => "SKIPPED",
            Self::Undefined => "UNDEFINED",
            Self::Error => "ERROR",
            Self::Failed => "FAILED",
        }
    }

    /// Localized label for summaries.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumo::NodeResult;
    ///
    /// assert_eq!(NodeResult::Passed.label(), "passed");
    /// ```
    #[must_use]
    pub fn label(self) -> String {
        localization::message(match self {
            Self::Passed => "result-passed",
            Self::NotImplemented => "result-not-implemented",
            Self::Skipped => "result-skipped",
            Self::Undefined => "result-undefined",
            Self::Error => "result-error",
            Self::Failed => "result-failed",
        })
    }
}

impl fmt::Display for NodeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text that names no result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown result '{0}'")]
pub struct UnknownResult(pub String);

impl FromStr for NodeResult {
    type Err = UnknownResult;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = value.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|result| result.as_str() == normalised)
            .ok_or_else(|| UnknownResult(value.trim().to_string()))
    }
}

/// Invalid severity order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SeverityOrderError {
    /// An entry names no result.
    #[error(transparent)]
    Unknown(#[from] UnknownResult),
    /// A result appears more than once.
    #[error("result {0} appears more than once in the severity order")]
    Duplicate(NodeResult),
    /// A result is missing.
    #[error("result {0} is missing from the severity order")]
    Missing(NodeResult),
    /// Something other than PASSED is the least severe result.
    #[error("PASSED must be the least severe result")]
    PassedNotLeast,
}

/// Total order over results, least to most severe.
///
/// # Examples
///
/// ```
/// use kumo::{NodeResult, SeverityOrder};
///
/// let order = SeverityOrder::default();
/// let worst = order.max([NodeResult::Passed, NodeResult::Failed, NodeResult::Error]);
/// assert_eq!(worst, Some(NodeResult::Failed));
///
/// let custom: SeverityOrder = "passed, not-implemented, skipped, undefined, failed, error"
///     .parse()
///     .expect("complete order");
/// assert_eq!(custom.max([NodeResult::Failed, NodeResult::Error]), Some(NodeResult::Error));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeverityOrder {
    ranked: Vec<NodeResult>,
}

impl Default for SeverityOrder {
    fn default() -> Self {
        Self {
            ranked: NodeResult::ALL.to_vec(),
        }
    }
}

impl SeverityOrder {
    /// Build an order from every result, least severe first.
    ///
    /// # Errors
    ///
    /// Returns [`SeverityOrderError`] unless `ranked` lists each result once
    /// with PASSED first.
    pub fn new(ranked: Vec<NodeResult>) -> Result<Self, SeverityOrderError> {
        for (position, result) in ranked.iter().enumerate() {
            if ranked.iter().skip(position + 1).any(|other| other == result) {
                return Err(SeverityOrderError::Duplicate(*result));
            }
        }
        if let Some(missing) = NodeResult::ALL.into_iter().find(|r| !ranked.contains(r)) {
            return Err(SeverityOrderError::Missing(missing));
        }
        if ranked.first() != Some(&NodeResult::Passed) {
            return Err(SeverityOrderError::PassedNotLeast);
        }
        Ok(Self { ranked })
    }

    /// Results from least to most severe.
    #[must_use]
    pub fn as_slice(&self) -> &[NodeResult] {
        &self.ranked
    }

    fn rank(&self, result: NodeResult) -> usize {
        self.ranked
            .iter()
            .position(|ranked| *ranked == result)
            .unwrap_or_default()
    }

    /// Compare two results by severity.
    #[must_use]
    pub fn compare(&self, lhs: NodeResult, rhs: NodeResult) -> Ordering {
        self.rank(lhs).cmp(&self.rank(rhs))
    }

    /// The most severe of `results`, `None` when empty.
    pub fn max(&self, results: impl IntoIterator<Item = NodeResult>) -> Option<NodeResult> {
        results
            .into_iter()
            .max_by(|lhs, rhs| self.compare(*lhs, *rhs))
    }
}

impl FromStr for SeverityOrder {
    type Err = SeverityOrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let ranked = value
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<NodeResult>, _>>()?;
        Self::new(ranked)
    }
}

impl fmt::Display for SeverityOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.ranked.iter().map(|result| result.as_str()).collect();
        f.write_str(&names.join(" < "))
    }
}
