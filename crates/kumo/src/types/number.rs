//! Locale number formats.

use super::{TypeError, primary_language};

/// Grouping and decimal separators of a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NumberFormat {
    grouping: &'static [char],
    decimal: char,
}

const ENGLISH: NumberFormat = NumberFormat {
    grouping: &[','],
    decimal: '.',
};
const CONTINENTAL: NumberFormat = NumberFormat {
    grouping: &['.'],
    decimal: ',',
};
const FRENCH: NumberFormat = NumberFormat {
    grouping: &[' ', '\u{a0}', '\u{202f}'],
    decimal: ',',
};

impl NumberFormat {
    pub(crate) fn for_language(language: &str) -> Self {
        match primary_language(language).as_str() {
            "es" | "de" => CONTINENTAL,
            "fr" => FRENCH,
            _ => ENGLISH,
        }
    }

    fn grouping_class(self) -> String {
        let escaped: String = self
            .grouping
            .iter()
            .map(|ch| regex::escape(&ch.to_string()))
            .collect();
        format!("[{escaped}]")
    }

    pub(crate) fn integer_regex(self) -> String {
        format!(r"[-+]?\d{{1,3}}(?:{}\d{{3}})+|[-+]?\d+", self.grouping_class())
    }

    pub(crate) fn decimal_regex(self) -> String {
        let point = regex::escape(&self.decimal.to_string());
        format!(
            r"[-+]?(?:\d{{1,3}}(?:{}\d{{3}})+|\d+)(?:{point}\d+)?|[-+]?{point}\d+",
            self.grouping_class()
        )
    }

    /// Remove grouping and normalise the decimal separator to `.`.
    fn normalise(self, text: &str) -> String {
        text.trim()
            .chars()
            .filter(|ch| !self.grouping.contains(ch))
            .map(|ch| if ch == self.decimal { '.' } else { ch })
            .collect()
    }

    pub(crate) fn parse_integer(self, type_name: &str, text: &str) -> Result<i64, TypeError> {
        let normalised = self.normalise(text);
        let digits = normalised.trim_start_matches(['-', '+']);
        if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(TypeError::malformed(type_name, text));
        }
        normalised.parse().map_err(|_| TypeError::Overflow {
            type_name: type_name.to_string(),
            text: text.to_string(),
        })
    }

    pub(crate) fn parse_decimal(self, type_name: &str, text: &str) -> Result<f64, TypeError> {
        let normalised = self.normalise(text);
        let body = normalised.trim_start_matches(['-', '+']);
        let valid = !body.is_empty()
            && body.chars().filter(|ch| *ch == '.').count() <= 1
            && body.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
            && body.chars().any(|ch| ch.is_ascii_digit());
        if !valid {
            return Err(TypeError::malformed(type_name, text));
        }
        normalised
            .parse()
            .map_err(|_| TypeError::malformed(type_name, text))
    }

    pub(crate) fn format_decimal(self, value: f64) -> String {
        value
            .to_string()
            .chars()
            .map(|ch| if ch == '.' { self.decimal } else { ch })
            .collect()
    }

    /// Grouped rendering used in hints, e.g. `1,234`.
    pub(crate) fn integer_sample(self) -> String {
        let group = self.grouping.first().copied().unwrap_or(',');
        format!("1{group}234")
    }

    /// Grouped rendering with a fraction, e.g. `1,234.5`.
    pub(crate) fn decimal_sample(self) -> String {
        format!("{}{}5", self.integer_sample(), self.decimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("en", "1,234", 1234)]
    #[case("en", "-42", -42)]
    #[case("es", "1.234.567", 1_234_567)]
    #[case("de-DE", "+7", 7)]
    #[case("fr", "12 000", 12_000)]
    fn parses_integers(#[case] language: &str, #[case] text: &str, #[case] expected: i64) {
        let format = NumberFormat::for_language(language);
        assert_eq!(format.parse_integer("integer", text), Ok(expected));
        let re = regex::Regex::new(&format!("^(?:{})$", format.integer_regex()))
            .unwrap_or_else(|error| panic!("{error}"));
        assert!(re.is_match(text), "{text} should match {re}");
    }

    #[rstest]
    #[case("en", "1,234.5", 1234.5)]
    #[case("es", "1.234,5", 1234.5)]
    #[case("en", ".5", 0.5)]
    #[case("fr", "-3,25", -3.25)]
    fn parses_decimals(#[case] language: &str, #[case] text: &str, #[case] expected: f64) {
        let format = NumberFormat::for_language(language);
        assert_eq!(format.parse_decimal("decimal", text), Ok(expected));
    }

    #[test]
    fn rejects_integer_overflow() {
        let result = ENGLISH.parse_integer("integer", "99999999999999999999");
        assert!(matches!(result, Err(TypeError::Overflow { .. })));
    }

    #[rstest]
    #[case("en", 1234.5)]
    #[case("es", -0.25)]
    fn decimal_round_trips_through_canonical_form(#[case] language: &str, #[case] value: f64) {
        let format = NumberFormat::for_language(language);
        assert_eq!(
            format.parse_decimal("decimal", &format.format_decimal(value)),
            Ok(value)
        );
    }
}
