//! Date and time formats.
//!
//! ISO 8601 forms are accepted in every language; each language adds its
//! customary numeric date layout.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{TypeError, primary_language};

const ISO_DATE: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

pub(crate) const TIME_REGEX: &str = r"\d{1,2}:\d{2}(?::\d{2}(?:\.\d{1,9})?)?";

/// Customary layout and matching expression for a language.
fn local_date(language: &str) -> (&'static str, &'static str) {
    match primary_language(language).as_str() {
        "es" | "fr" => ("%d/%m/%Y", r"\d{1,2}/\d{1,2}/\d{4}"),
        "de" => ("%d.%m.%Y", r"\d{1,2}\.\d{1,2}\.\d{4}"),
        _ => ("%m/%d/%Y", r"\d{1,2}/\d{1,2}/\d{4}"),
    }
}

pub(crate) fn date_regex(language: &str) -> String {
    format!(r"\d{{4}}-\d{{2}}-\d{{2}}|{}", local_date(language).1)
}

pub(crate) fn date_formats(language: &str) -> String {
    format!("{ISO_DATE}, {}", local_date(language).0)
}

pub(crate) fn parse_date(language: &str, text: &str) -> Result<NaiveDate, TypeError> {
    let text = text.trim();
    [ISO_DATE, local_date(language).0]
        .into_iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .ok_or_else(|| TypeError::malformed("date", text))
}

pub(crate) fn parse_time(text: &str) -> Result<NaiveTime, TypeError> {
    let text = text.trim();
    TIME_FORMATS
        .into_iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
        .ok_or_else(|| TypeError::malformed("time", text))
}

pub(crate) fn datetime_regex(language: &str) -> String {
    format!(r"(?:{})[T ]{TIME_REGEX}", date_regex(language))
}

pub(crate) fn parse_datetime(language: &str, text: &str) -> Result<NaiveDateTime, TypeError> {
    let text = text.trim();
    let malformed = || TypeError::malformed("datetime", text);
    let (date, time) = text
        .split_once('T')
        .or_else(|| text.split_once(' '))
        .ok_or_else(malformed)?;
    let date = parse_date(language, date).map_err(|_| malformed())?;
    let time = parse_time(time).map_err(|_| malformed())?;
    Ok(NaiveDateTime::new(date, time))
}

pub(crate) fn format_date(value: NaiveDate) -> String {
    value.format(ISO_DATE).to_string()
}

pub(crate) fn format_time(value: NaiveTime) -> String {
    value.format("%H:%M:%S%.f").to_string()
}

pub(crate) fn format_datetime(value: NaiveDateTime) -> String {
    format!("{}T{}", format_date(value.date()), format_time(value.time()))
}
