//! Regex capture helpers shared by the registry and assertion types.

use regex::Regex;

/// Extract the named capture groups when `text` matches `re`, returning `None`
/// otherwise.
///
/// Values are returned in the order of `groups`. Groups that do not take part
/// in the match yield empty strings to keep positional alignment with the
/// expression's arguments.
///
/// # Examples
/// ```
/// # use regex::Regex;
/// # use kumo_patterns::extract_named_values;
/// let regex = Regex::new(r"^(?P<arg0>\d+)-(?P<arg1>\w+)$")
///     .expect("example ensures fallible call succeeds");
/// let values = extract_named_values(&regex, "42-answer", ["arg0", "arg1"])
///     .expect("example ensures fallible call succeeds");
/// assert_eq!(values, vec!["42".to_string(), "answer".to_string()]);
/// assert!(extract_named_values(&regex, "nope", ["arg0"]).is_none());
/// ```
#[must_use]
pub fn extract_named_values<'g, I>(re: &Regex, text: &str, groups: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = &'g str>,
{
    let caps = re.captures(text)?;
    Some(
        groups
            .into_iter()
            .map(|group| {
                caps.name(group)
                    .map_or_else(String::new, |m| m.as_str().to_string())
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regex(source: &str) -> Regex {
        #[expect(
            clippy::expect_used,
            reason = "tests require descriptive panic messages"
        )]
        Regex::new(source).expect("test regex must compile")
    }

    #[test]
    fn returns_none_when_text_does_not_match() {
        let re = regex(r"^(?P<arg0>\d+)$");
        assert!(extract_named_values(&re, "nope", ["arg0"]).is_none());
    }

    #[test]
    fn collects_values_in_requested_order() {
        let re = regex(r"^(?P<arg0>\d+)-(?P<arg1>\w+)-(?P<arg2>\d+)$");
        let values = extract_named_values(&re, "12-answer-7", ["arg2", "arg0"]);
        assert_eq!(values, Some(vec!["7".to_string(), "12".to_string()]));
    }

    #[test]
    fn supports_groups_outside_the_match() {
        let re = regex(r"^(?P<arg0>a)?(?P<arg1>b)?$");
        let values = extract_named_values(&re, "a", ["arg0", "arg1", "missing"]);
        assert_eq!(
            values,
            Some(vec![String::from("a"), String::new(), String::new()])
        );
    }
}
