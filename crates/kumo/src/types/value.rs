//! Typed argument values.

use std::cmp::Ordering;
use std::fmt;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;

use super::assertion::Assertion;

/// A value coerced from step text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Whole number.
    Integer(i64),
    /// Number with a fractional part.
    Decimal(f64),
    /// Free text, quoted text with quotes removed, or an enumerated option.
    Text(String),
    /// Truth value.
    Boolean(bool),
    /// Calendar date.
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Date and time without a zone.
    DateTime(NaiveDateTime),
    /// Unsigned span of time.
    Duration(Duration),
    /// Predicate parsed from an assertion phrase.
    Assertion(Assertion),
    /// Absence of a value.
    Null,
}

impl Value {
    /// JSON rendering used in reports and step results.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Integer(value) => json!(value),
            Self::Decimal(value) => json!(value),
            Self::Text(value) => json!(value),
            Self::Boolean(value) => json!(value),
            Self::Date(value) => json!(value.format("%Y-%m-%d").to_string()),
            Self::Time(value) => json!(value.format("%H:%M:%S%.f").to_string()),
            Self::DateTime(value) => json!(value.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Self::Duration(value) => json!({ "nanos": value.as_nanos().to_string() }),
            Self::Assertion(assertion) => json!(assertion.to_string()),
            Self::Null => serde_json::Value::Null,
        }
    }

    /// Convert a JSON value into the closest plain value.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(flag) => Self::Boolean(*flag),
            serde_json::Value::Number(number) => number
                .as_i64()
                .map(Self::Integer)
                .or_else(|| number.as_f64().map(Self::Decimal))
                .unwrap_or(Self::Null),
            serde_json::Value::String(text) => Self::Text(text.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Order two values of compatible kinds.
    ///
    /// Integers and decimals compare numerically with each other; every other
    /// kind only compares with itself.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Integer(lhs), Self::Integer(rhs)) => Some(lhs.cmp(rhs)),
            (Self::Decimal(lhs), Self::Decimal(rhs)) => lhs.partial_cmp(rhs),
            (Self::Integer(lhs), Self::Decimal(rhs)) => widen(*lhs).partial_cmp(rhs),
            (Self::Decimal(lhs), Self::Integer(rhs)) => lhs.partial_cmp(&widen(*rhs)),
            (Self::Text(lhs), Self::Text(rhs)) => Some(lhs.cmp(rhs)),
            (Self::Boolean(lhs), Self::Boolean(rhs)) => Some(lhs.cmp(rhs)),
            (Self::Date(lhs), Self::Date(rhs)) => Some(lhs.cmp(rhs)),
            (Self::Time(lhs), Self::Time(rhs)) => Some(lhs.cmp(rhs)),
            (Self::DateTime(lhs), Self::DateTime(rhs)) => Some(lhs.cmp(rhs)),
            (Self::Duration(lhs), Self::Duration(rhs)) => Some(lhs.cmp(rhs)),
            _ => None,
        }
    }

    /// Text form used by textual assertions.
    #[must_use]
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Null | Self::Assertion(_) => None,
            Self::Text(text) => Some(text.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[expect(
    clippy::cast_precision_loss,
    reason = "mixed integer and decimal comparisons accept rounding of huge integers"
)]
const fn widen(value: i64) -> f64 {
    value as f64
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => value.fmt(f),
            Self::Decimal(value) => value.fmt(f),
            Self::Text(value) => f.write_str(value),
            Self::Boolean(value) => value.fmt(f),
            Self::Date(value) => value.format("%Y-%m-%d").fmt(f),
            Self::Time(value) => value.format("%H:%M:%S%.f").fmt(f),
            Self::DateTime(value) => value.format("%Y-%m-%dT%H:%M:%S%.f").fmt(f),
            Self::Duration(value) => write!(f, "{value:?}"),
            Self::Assertion(assertion) => assertion.fmt(f),
            Self::Null => f.write_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_mixed_numbers() {
        assert_eq!(Value::Integer(2).compare(&Value::Decimal(1.5)), Some(Ordering::Greater));
        assert_eq!(Value::Text("a".into()).compare(&Value::Integer(1)), None);
    }

    #[test]
    fn converts_from_json() {
        assert_eq!(Value::from_json(&json!(3)), Value::Integer(3));
        assert_eq!(Value::from_json(&json!("x")), Value::Text("x".into()));
        assert_eq!(Value::from_json(&json!(null)), Value::Null);
    }
}
