//! Engine configuration.
//!
//! Settings are read through the [`Configuration`] trait, a key to string
//! lookup with typed accessors. [`MapConfiguration`] backs it with a map that
//! can be filled from pairs or from `KUMO_*` environment variables, and
//! [`EngineConfig::from_configuration`] turns the `kumo.*` keys into the
//! options used by compilation, matching, resolution and aggregation.

use std::collections::BTreeMap;
use std::time::Duration;

use thiserror::Error;

use crate::execution::{SeverityOrder, SeverityOrderError};
use crate::plan::{CompileOptions, TagFilter, TagFilterError};
use crate::properties::DEFAULT_MAX_ITERATIONS;
use crate::registry::AmbiguityPolicy;

const ENV_PREFIX: &str = "KUMO_";
const PROPERTY_PREFIX: &str = "kumo.property.";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A value does not have the expected shape.
    #[error("invalid value '{value}' for {key}: expected {expected}")]
    Invalid {
        /// Offending key.
        key: String,
        /// Offending value.
        value: String,
        /// Description of accepted values.
        expected: &'static str,
    },
    /// `kumo.tag-filter` does not parse.
    #[error("invalid kumo.tag-filter: {0}")]
    TagFilter(#[from] TagFilterError),
    /// `kumo.id-tag-pattern` is not a regular expression.
    #[error("invalid kumo.id-tag-pattern: {0}")]
    IdTagPattern(#[from] regex::Error),
    /// `kumo.severity-order` is not a complete order.
    #[error("invalid kumo.severity-order: {0}")]
    SeverityOrder(#[from] SeverityOrderError),
    /// `kumo.ambiguity` names no policy.
    #[error("invalid kumo.ambiguity: {0}")]
    Ambiguity(String),
}

fn invalid(key: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

fn parse_env_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "Yes" | "on" | "ON" | "On" => Some(true),
        "0" | "false" | "FALSE" | "False" | "no" | "NO" | "No" | "off" | "OFF" | "Off" => {
            Some(false)
        }
        _ => None,
    }
}

fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let amount: u64 = digits.parse().ok()?;
    let seconds = |factor: u64| amount.checked_mul(factor).map(Duration::from_secs);
    match unit.trim() {
        "ns" => Some(Duration::from_nanos(amount)),
        "us" | "µs" => Some(Duration::from_micros(amount)),
        "ms" => Some(Duration::from_millis(amount)),
        "" | "s" => Some(Duration::from_secs(amount)),
        "m" => seconds(60),
        "h" => seconds(3_600),
        "d" => seconds(86_400),
        _ => None,
    }
}

/// Read-only key to value lookup with typed accessors.
///
/// Implementors provide [`raw`](Self::raw) and [`keys`](Self::keys); the
/// typed accessors parse on top of them. A missing key is `Ok(None)`, a
/// malformed one is an error naming the key.
pub trait Configuration {
    /// Raw value of `key`.
    fn raw(&self, key: &str) -> Option<&str>;

    /// Every key, sorted.
    fn keys(&self) -> Vec<&str>;

    /// Trimmed, non-empty value of `key`.
    fn string(&self, key: &str) -> Option<String> {
        self.raw(key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(ToString::to_string)
    }

    /// Value of `key` as an integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the value is not an integer.
    fn integer(&self, key: &str) -> Result<Option<i64>, ConfigError> {
        self.string(key)
            .map(|value| value.parse().map_err(|_| invalid(key, &value, "an integer")))
            .transpose()
    }

    /// Value of `key` as a boolean: `1/0`, `true/false`, `yes/no` or
    /// `on/off`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for any other value.
    fn boolean(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.string(key)
            .map(|value| parse_env_bool(&value).ok_or_else(|| invalid(key, &value, "a boolean")))
            .transpose()
    }

    /// Value of `key` as a duration such as `250ms`, `30s`, `5m` or `2h`.
    /// A bare number counts seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the value is not a duration.
    fn duration(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
        self.string(key)
            .map(|value| parse_duration(&value).ok_or_else(|| invalid(key, &value, "a duration")))
            .transpose()
    }

    /// Comma-separated entries of `key`, trimmed, empty entries dropped.
    fn list(&self, key: &str) -> Vec<String> {
        self.raw(key)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Entries whose key starts with `prefix`, keyed by the remainder.
    fn with_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                let name = key.strip_prefix(prefix)?;
                Some((name.to_string(), self.raw(key)?.to_string()))
            })
            .collect()
    }
}

/// [`Configuration`] backed by an ordered map.
///
/// # Examples
///
/// ```
/// use kumo::config::{Configuration, MapConfiguration};
///
/// let config = MapConfiguration::from_vars([
///     ("KUMO_TAG_FILTER", "@smoke"),
///     ("KUMO_PROPERTIES__MAX_ITERATIONS", "8"),
///     ("HOME", "/root"),
/// ]);
/// assert_eq!(config.string("kumo.tag-filter").as_deref(), Some("@smoke"));
/// assert_eq!(config.integer("kumo.properties.max-iterations").ok().flatten(), Some(8));
/// assert_eq!(config.keys().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapConfiguration {
    entries: BTreeMap<String, String>,
}

impl MapConfiguration {
    /// An empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Overlay the entries of `other`, which win on conflict.
    pub fn merge(&mut self, other: Self) -> &mut Self {
        self.entries.extend(other.entries);
        self
    }

    /// Read `KUMO_*` variables: the prefix maps to `kumo.`, `__` to `.`, `_`
    /// to `-`, and names are lower-cased.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let entries = vars
            .into_iter()
            .filter_map(|(name, value)| {
                let rest = name.as_ref().strip_prefix(ENV_PREFIX)?;
                let key = rest
                    .to_ascii_lowercase()
                    .split("__")
                    .map(|segment| segment.replace('_', "-"))
                    .collect::<Vec<_>>()
                    .join(".");
                Some((format!("kumo.{key}"), value.into()))
            })
            .collect();
        Self { entries }
    }

    /// Read `KUMO_*` variables from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapConfiguration {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl Configuration for MapConfiguration {
    fn raw(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }
}

/// Options for one engine, read from `kumo.*` keys.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Default document language.
    pub language: String,
    /// Compilation options: tag filter, filtered nodes and id tags.
    pub compile: CompileOptions,
    /// Resolution of overlapping step expressions.
    pub ambiguity: AmbiguityPolicy,
    /// Cap on property substitutions per text.
    pub max_iterations: usize,
    /// Order used to aggregate results.
    pub severity_order: SeverityOrder,
    /// Global properties from `kumo.property.<name>`.
    pub globals: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            compile: CompileOptions::default(),
            ambiguity: AmbiguityPolicy::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            severity_order: SeverityOrder::default(),
            globals: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Read every `kumo.*` setting, defaulting the missing ones.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the first malformed setting.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumo::config::{EngineConfig, MapConfiguration};
    /// use kumo::registry::AmbiguityPolicy;
    ///
    /// let config: MapConfiguration = [
    ///     ("kumo.language", "es"),
    ///     ("kumo.ambiguity", "most-specific"),
    ///     ("kumo.property.host", "localhost"),
    /// ]
    /// .into_iter()
    /// .collect();
    /// let engine = EngineConfig::from_configuration(&config).expect("valid settings");
    /// assert_eq!(engine.language, "es");
    /// assert_eq!(engine.ambiguity, AmbiguityPolicy::MostSpecific);
    /// assert_eq!(engine.globals.get("host").map(String::as_str), Some("localhost"));
    /// assert_eq!(engine.max_iterations, 16);
    /// ```
    pub fn from_configuration(config: &impl Configuration) -> Result<Self, ConfigError> {
        let mut engine = Self::default();
        if let Some(language) = config.string("kumo.language") {
            engine.language = language;
        }
        if let Some(filter) = config.string("kumo.tag-filter") {
            engine.compile.tag_filter = Some(TagFilter::parse(&filter)?);
        }
        if let Some(include) = config.boolean("kumo.include-filtered")? {
            engine.compile.include_filtered = include;
        }
        if let Some(pattern) = config.string("kumo.id-tag-pattern") {
            engine.compile = engine.compile.with_id_tag_pattern(&pattern)?;
        }
        if let Some(policy) = config.string("kumo.ambiguity") {
            engine.ambiguity = policy.parse().map_err(ConfigError::Ambiguity)?;
        }
        if let Some(cap) = config.integer("kumo.properties.max-iterations")? {
            engine.max_iterations = usize::try_from(cap).map_err(|_| {
                invalid(
                    "kumo.properties.max-iterations",
                    &cap.to_string(),
                    "a non-negative integer",
                )
            })?;
        }
        if let Some(order) = config.string("kumo.severity-order") {
            engine.severity_order = order.parse()?;
        }
        engine.globals = config.with_prefix(PROPERTY_PREFIX);
        log::debug!(
            "engine configured for '{}' with {} global properties",
            engine.language,
            engine.globals.len()
        );
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::NodeResult;
    use rstest::rstest;

    fn config(pairs: &[(&str, &str)]) -> MapConfiguration {
        pairs.iter().copied().collect()
    }

    #[test]
    fn parse_env_bool_understands_common_values() {
        for truthy in [
            "1", "true", "TRUE", "True", "yes", "YES", "Yes", "on", "ON", "On",
        ] {
            assert_eq!(
                parse_env_bool(truthy),
                Some(true),
                "expected {truthy} to be truthy"
            );
        }
        for falsy in [
            "0", "false", "FALSE", "False", "no", "NO", "No", "off", "OFF", "Off",
        ] {
            assert_eq!(
                parse_env_bool(falsy),
                Some(false),
                "expected {falsy} to be falsy"
            );
        }
        assert_eq!(parse_env_bool("maybe"), None);
    }

    #[rstest]
    #[case("250ms", Duration::from_millis(250))]
    #[case("30", Duration::from_secs(30))]
    #[case("5m", Duration::from_secs(300))]
    #[case(" 2h ", Duration::from_secs(7_200))]
    fn reads_durations(#[case] text: &str, #[case] expected: Duration) {
        let config = config(&[("timeout", text)]);
        assert_eq!(config.duration("timeout").ok().flatten(), Some(expected));
    }

    #[rstest]
    #[case("kumo.include-filtered", "perhaps")]
    #[case("kumo.properties.max-iterations", "-1")]
    #[case("kumo.properties.max-iterations", "many")]
    #[case("kumo.tag-filter", "@a and")]
    #[case("kumo.id-tag-pattern", "(")]
    #[case("kumo.ambiguity", "random")]
    #[case("kumo.severity-order", "passed, failed")]
    fn rejects_malformed_settings(#[case] key: &str, #[case] value: &str) {
        assert!(EngineConfig::from_configuration(&config(&[(key, value)])).is_err());
    }

    #[test]
    fn defaults_apply_without_settings() {
        let engine = EngineConfig::from_configuration(&MapConfiguration::new())
            .unwrap_or_else(|error| panic!("{error}"));
        assert_eq!(engine.language, "en");
        assert_eq!(engine.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(engine.ambiguity, AmbiguityPolicy::Strict);
        assert!(engine.compile.tag_filter.is_none());
        assert!(engine.globals.is_empty());
    }

    #[test]
    fn reads_every_setting() {
        let engine = EngineConfig::from_configuration(&config(&[
            ("kumo.tag-filter", "@smoke and not @wip"),
            ("kumo.include-filtered", "yes"),
            ("kumo.properties.max-iterations", "4"),
            (
                "kumo.severity-order",
                "passed, not_implemented, skipped, undefined, failed, error",
            ),
            ("kumo.property.user", "ana"),
        ]))
        .unwrap_or_else(|error| panic!("{error}"));
        assert!(engine.compile.tag_filter.is_some());
        assert!(engine.compile.include_filtered);
        assert_eq!(engine.max_iterations, 4);
        assert_eq!(
            engine.severity_order.max([NodeResult::Failed, NodeResult::Error]),
            Some(NodeResult::Error)
        );
        assert_eq!(engine.globals.get("user").map(String::as_str), Some("ana"));
    }

    #[test]
    fn environment_names_map_to_keys() {
        let config = MapConfiguration::from_vars([
            ("KUMO_ID_TAG_PATTERN", "T-\\d+"),
            ("KUMO_PROPERTY__BASE_URL", "http://localhost"),
            ("PATH", "/bin"),
        ]);
        assert_eq!(
            config.keys(),
            ["kumo.id-tag-pattern", "kumo.property.base-url"]
        );
        let mut merged = config.clone();
        merged.merge(MapConfiguration::from_iter([("kumo.id-tag-pattern", "ID-\\d+")]));
        assert_eq!(merged.string("kumo.id-tag-pattern").as_deref(), Some("ID-\\d+"));
        assert_eq!(config.list("kumo.property.base-url"), ["http://localhost"]);
    }
}
