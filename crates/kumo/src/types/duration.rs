//! Duration phrases such as `3 seconds` or `2 minutos`.
//!
//! The sign of the amount is ignored: durations are magnitudes.

use std::time::Duration;

use super::{TypeError, primary_language};

/// Unit names (singular, plural) and length in nanoseconds.
type UnitTable = &'static [(&'static str, &'static str, u64)];

const NANOS_PER_SECOND: u64 = 1_000_000_000;

const ENGLISH_UNITS: UnitTable = &[
    ("nanosecond", "nanoseconds", 1),
    ("microsecond", "microseconds", 1_000),
    ("millisecond", "milliseconds", 1_000_000),
    ("second", "seconds", NANOS_PER_SECOND),
    ("minute", "minutes", 60 * NANOS_PER_SECOND),
    ("hour", "hours", 3_600 * NANOS_PER_SECOND),
    ("day", "days", 86_400 * NANOS_PER_SECOND),
];

const SPANISH_UNITS: UnitTable = &[
    ("nanosegundo", "nanosegundos", 1),
    ("microsegundo", "microsegundos", 1_000),
    ("milisegundo", "milisegundos", 1_000_000),
    ("segundo", "segundos", NANOS_PER_SECOND),
    ("minuto", "minutos", 60 * NANOS_PER_SECOND),
    ("hora", "horas", 3_600 * NANOS_PER_SECOND),
    ("día", "días", 86_400 * NANOS_PER_SECOND),
];

fn units(language: &str) -> UnitTable {
    match primary_language(language).as_str() {
        "es" => SPANISH_UNITS,
        _ => ENGLISH_UNITS,
    }
}

pub(crate) fn duration_regex(language: &str) -> String {
    let mut names: Vec<&str> = units(language)
        .iter()
        .flat_map(|(singular, plural, _)| [*plural, *singular])
        .collect();
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    let alternatives: Vec<String> = names.into_iter().map(regex::escape).collect();
    format!(r"[-+]?\d+\s+(?:{})", alternatives.join("|"))
}

pub(crate) fn unit_names(language: &str) -> String {
    units(language)
        .iter()
        .map(|(_, plural, _)| *plural)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn parse_duration(language: &str, text: &str) -> Result<Duration, TypeError> {
    let text = text.trim();
    let malformed = || TypeError::malformed("duration", text);
    let (amount, unit) = text.split_once(char::is_whitespace).ok_or_else(malformed)?;
    let unit = unit.trim();
    let nanos_per_unit = units(language)
        .iter()
        .find(|(singular, plural, _)| unit == *singular || unit == *plural)
        .map(|(_, _, nanos)| *nanos)
        .ok_or_else(malformed)?;
    let amount: i64 = amount.parse().map_err(|_| malformed())?;
    amount
        .unsigned_abs()
        .checked_mul(nanos_per_unit)
        .map(Duration::from_nanos)
        .ok_or_else(|| TypeError::Overflow {
            type_name: "duration".to_string(),
            text: text.to_string(),
        })
}

pub(crate) fn format_duration(language: &str, value: Duration) -> Option<String> {
    let nanos = u64::try_from(value.as_nanos()).ok()?;
    units(language)
        .iter()
        .rev()
        .find(|(_, _, size)| nanos.checked_rem(*size) == Some(0))
        .and_then(|(singular, plural, size)| {
            let amount = nanos.checked_div(*size)?;
            Some(if amount == 1 {
                format!("{amount} {singular}")
            } else {
                format!("{amount} {plural}")
            })
        })
}
