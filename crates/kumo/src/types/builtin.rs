//! Built-in data types and constructors for custom ones.

use super::assertion::{Family, assertion_type};
use super::duration::{duration_regex, format_duration, parse_duration, unit_names};
use super::number::NumberFormat;
use super::temporal::{
    TIME_REGEX, date_formats, date_regex, datetime_regex, format_date, format_datetime,
    format_time, parse_date, parse_datetime, parse_time,
};
use super::{DataType, TypeDefinitionError, TypeError, Value, primary_language};
use crate::localization::message_in;

const TEXT_REGEX: &str = r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#;

fn boolean_words(language: &str) -> (&'static str, &'static str) {
    match primary_language(language).as_str() {
        "es" => ("verdadero", "falso"),
        "fr" => ("vrai", "faux"),
        "de" => ("wahr", "falsch"),
        _ => ("true", "false"),
    }
}

fn hint(id: &'static str) -> impl Fn(&str) -> String + Send + Sync + 'static {
    move |language| message_in(language, id, |_| {})
}

/// Strip the surrounding quotes of a quoted literal and unescape its content.
fn unquote(text: &str) -> Option<String> {
    let mut chars = text.trim().chars();
    let quote = chars.next().filter(|ch| matches!(ch, '"' | '\''))?;
    let inner: String = chars.collect();
    let body = inner.strip_suffix(quote)?;
    let mut unescaped = String::with_capacity(body.len());
    let mut escaping = false;
    for ch in body.chars() {
        if escaping {
            unescaped.push(ch);
            escaping = false;
        } else if ch == '\\' {
            escaping = true;
        } else {
            unescaped.push(ch);
        }
    }
    Some(unescaped)
}

/// Types always available to step expressions.
#[must_use]
pub fn builtin_types() -> Vec<DataType> {
    let simple = [
        integer(),
        decimal(),
        word(),
        id(),
        text(),
        boolean(),
        date(),
        time(),
        datetime(),
        duration(),
    ];
    let mut types: Vec<DataType> = simple.into_iter().flatten().collect();
    let find = |name: &str| types.iter().find(|data_type| data_type.name() == name).cloned();
    let assertions = [
        ("integer-assertion", Family::Comparable, find("integer")),
        ("decimal-assertion", Family::Comparable, find("decimal")),
        ("text-assertion", Family::Textual, find("text")),
        ("duration-assertion", Family::Comparable, find("duration")),
        ("date-assertion", Family::Comparable, find("date")),
    ];
    let built: Vec<DataType> = assertions
        .into_iter()
        .filter_map(|(name, family, inner)| assertion_type(name, family, inner?).ok())
        .collect();
    types.extend(built);
    types
}

fn integer() -> Result<DataType, TypeDefinitionError> {
    Ok(DataType::new(
        "integer",
        |language| NumberFormat::for_language(language).integer_regex(),
        |language, text| {
            NumberFormat::for_language(language)
                .parse_integer("integer", text)
                .map(Value::Integer)
        },
        |language| {
            let sample = NumberFormat::for_language(language).integer_sample();
            message_in(language, "type-hint-integer", |args| {
                args.set("sample", sample);
            })
        },
    )?
    .with_formatter(|_, value| match value {
        Value::Integer(number) => Some(number.to_string()),
        _ => None,
    }))
}

fn decimal() -> Result<DataType, TypeDefinitionError> {
    Ok(DataType::new(
        "decimal",
        |language| NumberFormat::for_language(language).decimal_regex(),
        |language, text| {
            NumberFormat::for_language(language)
                .parse_decimal("decimal", text)
                .map(Value::Decimal)
        },
        |language| {
            let sample = NumberFormat::for_language(language).decimal_sample();
            message_in(language, "type-hint-decimal", |args| {
                args.set("sample", sample);
            })
        },
    )?
    .with_formatter(|language, value| match value {
        Value::Decimal(number) => Some(NumberFormat::for_language(language).format_decimal(*number)),
        _ => None,
    }))
}

fn word() -> Result<DataType, TypeDefinitionError> {
    DataType::new(
        "word",
        |_| r"[\w-]+".into(),
        |_, text| Ok(Value::Text(text.to_string())),
        hint("type-hint-word"),
    )
}

fn id() -> Result<DataType, TypeDefinitionError> {
    DataType::new(
        "id",
        |_| r"\w[\w.:-]*".into(),
        |_, text| Ok(Value::Text(text.to_string())),
        hint("type-hint-id"),
    )
}

fn text() -> Result<DataType, TypeDefinitionError> {
    DataType::new(
        "text",
        |_| TEXT_REGEX.into(),
        |_, text| {
            unquote(text)
                .map(Value::Text)
                .ok_or_else(|| TypeError::malformed("text", text))
        },
        hint("type-hint-text"),
    )
}

fn boolean() -> Result<DataType, TypeDefinitionError> {
    Ok(DataType::new(
        "boolean",
        |language| {
            let (yes, no) = boolean_words(language);
            format!("(?i:{yes}|{no})")
        },
        |language, text| {
            let (yes, no) = boolean_words(language);
            let text = text.trim();
            if text.eq_ignore_ascii_case(yes) {
                Ok(Value::Boolean(true))
            } else if text.eq_ignore_ascii_case(no) {
                Ok(Value::Boolean(false))
            } else {
                Err(TypeError::malformed("boolean", text))
            }
        },
        |language| {
            let (yes, no) = boolean_words(language);
            message_in(language, "type-hint-boolean", |args| {
                args.set("options", format!("{yes}, {no}"));
            })
        },
    )?
    .with_formatter(|language, value| match value {
        Value::Boolean(flag) => {
            let (yes, no) = boolean_words(language);
            Some(if *flag { yes } else { no }.to_string())
        }
        _ => None,
    }))
}

fn date() -> Result<DataType, TypeDefinitionError> {
    Ok(DataType::new(
        "date",
        date_regex,
        |language, text| parse_date(language, text).map(Value::Date),
        |language| {
            let formats = date_formats(language);
            message_in(language, "type-hint-date", |args| {
                args.set("formats", formats);
            })
        },
    )?
    .with_formatter(|_, value| match value {
        Value::Date(date) => Some(format_date(*date)),
        _ => None,
    }))
}

fn time() -> Result<DataType, TypeDefinitionError> {
    Ok(DataType::new(
        "time",
        |_| TIME_REGEX.into(),
        |_, text| parse_time(text).map(Value::Time),
        hint("type-hint-time"),
    )?
    .with_formatter(|_, value| match value {
        Value::Time(time) => Some(format_time(*time)),
        _ => None,
    }))
}

fn datetime() -> Result<DataType, TypeDefinitionError> {
    Ok(DataType::new(
        "datetime",
        datetime_regex,
        |language, text| parse_datetime(language, text).map(Value::DateTime),
        |language| {
            let formats = date_formats(language);
            message_in(language, "type-hint-datetime", |args| {
                args.set("formats", formats);
            })
        },
    )?
    .with_formatter(|_, value| match value {
        Value::DateTime(datetime) => Some(format_datetime(*datetime)),
        _ => None,
    }))
}

fn duration() -> Result<DataType, TypeDefinitionError> {
    Ok(DataType::new(
        "duration",
        duration_regex,
        |language, text| parse_duration(language, text).map(Value::Duration),
        |language| {
            let units = unit_names(language);
            message_in(language, "type-hint-duration", |args| {
                args.set("units", units);
            })
        },
    )?
    .with_formatter(|language, value| match value {
        Value::Duration(duration) => format_duration(language, *duration),
        _ => None,
    }))
}

impl DataType {
    /// A type accepting one of a fixed set of options, matched exactly.
    ///
    /// # Errors
    ///
    /// Returns [`TypeDefinitionError::EmptyOptions`] when `options` is empty,
    /// or [`TypeDefinitionError::InvalidName`] for an unusable name.
    ///
    /// # Examples
    ///
    /// ```
    /// use kumo::types::{DataType, Value};
    ///
    /// let colour = DataType::enumerated("colour", &["red", "green"]).expect("valid type");
    /// assert_eq!(colour.parse("en", "green"), Ok(Value::Text("green".into())));
    /// assert!(colour.parse("en", "blue").is_err());
    /// ```
    pub fn enumerated(name: &str, options: &[&str]) -> Result<Self, TypeDefinitionError> {
        if options.is_empty() {
            return Err(TypeDefinitionError::EmptyOptions {
                type_name: name.to_string(),
            });
        }
        let mut ordered: Vec<String> = options.iter().map(|option| (*option).to_string()).collect();
        ordered.sort_by_key(|option| std::cmp::Reverse(option.len()));
        let pattern = ordered
            .iter()
            .map(|option| regex::escape(option))
            .collect::<Vec<_>>()
            .join("|");
        let allowed: Vec<String> = options.iter().map(|option| (*option).to_string()).collect();
        let listed = allowed.join(", ");
        Self::new(
            name,
            move |_| pattern.clone(),
            move |_, text| {
                allowed
                    .iter()
                    .find(|option| option.as_str() == text)
                    .map(|option| Value::Text(option.clone()))
                    .ok_or_else(|| TypeError::UnknownOption {
                        text: text.to_string(),
                        options: allowed.clone(),
                    })
            },
            move |language| {
                message_in(language, "type-hint-enum", |args| {
                    args.set("options", listed.clone());
                })
            },
        )
    }

    /// An integer type restricted to `min..=max`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeDefinitionError::InvalidBounds`] when `min > max`.
    pub fn bounded_integer(name: &str, min: i64, max: i64) -> Result<Self, TypeDefinitionError> {
        if min > max {
            return Err(TypeDefinitionError::InvalidBounds {
                type_name: name.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        let type_name = name.to_string();
        Ok(Self::new(
            name,
            |language| NumberFormat::for_language(language).integer_regex(),
            move |language, text| {
                let value = NumberFormat::for_language(language).parse_integer(&type_name, text)?;
                if (min..=max).contains(&value) {
                    Ok(Value::Integer(value))
                } else {
                    Err(TypeError::OutOfRange {
                        value: value.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    })
                }
            },
            move |language| {
                message_in(language, "type-hint-integer-bounded", |args| {
                    args.set("min", min.to_string());
                    args.set("max", max.to_string());
                })
            },
        )?
        .with_formatter(|_, value| match value {
            Value::Integer(number) => Some(number.to_string()),
            _ => None,
        }))
    }

    /// A decimal type restricted to `min..=max`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeDefinitionError::InvalidBounds`] when `min > max` or
    /// either bound is not a number.
    pub fn bounded_decimal(name: &str, min: f64, max: f64) -> Result<Self, TypeDefinitionError> {
        if min.partial_cmp(&max).is_none_or(std::cmp::Ordering::is_gt) {
            return Err(TypeDefinitionError::InvalidBounds {
                type_name: name.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        let type_name = name.to_string();
        Ok(Self::new(
            name,
            |language| NumberFormat::for_language(language).decimal_regex(),
            move |language, text| {
                let value = NumberFormat::for_language(language).parse_decimal(&type_name, text)?;
                if value >= min && value <= max {
                    Ok(Value::Decimal(value))
                } else {
                    Err(TypeError::OutOfRange {
                        value: value.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    })
                }
            },
            move |language| {
                message_in(language, "type-hint-decimal-bounded", |args| {
                    args.set("min", min.to_string());
                    args.set("max", max.to_string());
                })
            },
        )?
        .with_formatter(|language, value| match value {
            Value::Decimal(number) => {
                Some(NumberFormat::for_language(language).format_decimal(*number))
            }
            _ => None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;
    use std::time::Duration;

    fn builtin(name: &str) -> DataType {
        builtin_types()
            .into_iter()
            .find(|data_type| data_type.name() == name)
            .unwrap_or_else(|| panic!("{name} is built in"))
    }

    #[test]
    fn every_builtin_is_registered() {
        let names: Vec<String> = builtin_types()
            .iter()
            .map(|data_type| data_type.name().to_string())
            .collect();
        assert_eq!(names.len(), 15, "{names:?}");
    }

    #[rstest]
    #[case("integer", "en", "1,234", Value::Integer(1234))]
    #[case("decimal", "es", "2,5", Value::Decimal(2.5))]
    #[case("word", "en", "alpha-1", Value::Text("alpha-1".into()))]
    #[case("text", "en", r#""say \"hi\"""#, Value::Text("say \"hi\"".into()))]
    #[case("text", "fr", "'x'", Value::Text("x".into()))]
    #[case("boolean", "es", "Verdadero", Value::Boolean(true))]
    #[case("boolean", "de", "falsch", Value::Boolean(false))]
    #[case("duration", "en", "1 nanosecond", Value::Duration(Duration::from_nanos(1)))]
    #[case("duration", "en", "-2 nanoseconds", Value::Duration(Duration::from_nanos(2)))]
    fn parses_builtin_values(
        #[case] name: &str,
        #[case] language: &str,
        #[case] text: &str,
        #[case] expected: Value,
    ) {
        let data_type = builtin(name);
        assert_eq!(data_type.parse(language, text), Ok(expected));
        let re = regex::Regex::new(&format!("^{}$", data_type.regex(language)))
            .unwrap_or_else(|error| panic!("{error}"));
        assert!(re.is_match(text), "{text} should match {name}");
    }

    #[rstest]
    #[case("integer", Value::Integer(-9_000))]
    #[case("decimal", Value::Decimal(12.75))]
    #[case("boolean", Value::Boolean(false))]
    #[case(
        "date",
        Value::Date(NaiveDate::from_ymd_opt(2020, 2, 29).unwrap_or_default())
    )]
    #[case("duration", Value::Duration(Duration::from_secs(90)))]
    fn canonical_forms_parse_back(#[case] name: &str, #[case] value: Value) {
        let data_type = builtin(name);
        for language in ["en", "es", "fr", "de"] {
            let text = data_type
                .format(language, &value)
                .unwrap_or_else(|| panic!("{name} formats {value:?}"));
            assert_eq!(data_type.parse(language, &text), Ok(value.clone()), "{language}: {text}");
        }
    }

    #[test]
    fn bounded_integer_rejects_inverted_bounds_and_out_of_range_values() {
        assert!(matches!(
            DataType::bounded_integer("percent", 100, 0),
            Err(TypeDefinitionError::InvalidBounds { .. })
        ));
        let percent = DataType::bounded_integer("percent", 0, 100)
            .unwrap_or_else(|error| panic!("{error}"));
        assert_eq!(percent.parse("en", "42"), Ok(Value::Integer(42)));
        assert!(matches!(
            percent.parse("en", "101"),
            Err(TypeError::OutOfRange { .. })
        ));
        assert!(percent.hint("en").contains("100"));
    }

    #[test]
    fn bounded_decimal_rejects_nan_bounds() {
        assert!(DataType::bounded_decimal("ratio", f64::NAN, 1.0).is_err());
    }

    #[test]
    fn enumerated_requires_options() {
        assert!(matches!(
            DataType::enumerated("empty", &[]),
            Err(TypeDefinitionError::EmptyOptions { .. })
        ));
    }

    #[test]
    fn hints_follow_document_language() {
        let integer = builtin("integer");
        assert_ne!(integer.hint("en"), integer.hint("es"));
    }
}
