//! The JSON path subset accepted by step result references: `$`, `.key`,
//! `['key']` and `[index]`.

use super::PropertyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Key(String),
    Index(usize),
}

pub(crate) fn parse_path(path: &str) -> Result<Vec<Segment>, PropertyError> {
    let path = path.trim();
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let invalid = |reason: &str| PropertyError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    };
    let mut rest = path.strip_prefix('$').ok_or_else(|| invalid("must start with '$'"))?;
    let mut segments = Vec::new();
    while let Some(first) = rest.chars().next() {
        match first {
            '.' => {
                let body = rest.get(1..).unwrap_or_default();
                let end = body.find(['.', '[']).unwrap_or(body.len());
                let (key, tail) = body.split_at(end);
                if key.is_empty() {
                    return Err(invalid("empty key"));
                }
                segments.push(Segment::Key(key.to_string()));
                rest = tail;
            }
            '[' => {
                let close = rest.find(']').ok_or_else(|| invalid("missing ']'"))?;
                let inner = rest.get(1..close).unwrap_or_default().trim();
                let quoted = inner
                    .strip_prefix('\'')
                    .and_then(|text| text.strip_suffix('\''))
                    .or_else(|| inner.strip_prefix('"').and_then(|text| text.strip_suffix('"')));
                let segment = match quoted {
                    Some(key) => Segment::Key(key.to_string()),
                    None => Segment::Index(
                        inner
                            .parse()
                            .map_err(|_| invalid("index must be a non-negative integer"))?,
                    ),
                };
                segments.push(segment);
                rest = rest.get(close + 1..).unwrap_or_default();
            }
            _ => return Err(invalid("expected '.' or '['")),
        }
    }
    Ok(segments)
}

pub(crate) fn select<'v>(
    value: &'v serde_json::Value,
    segments: &[Segment],
) -> Option<&'v serde_json::Value> {
    segments
        .iter()
        .try_fold(value, |current, segment| match segment {
            Segment::Key(key) => current.get(key.as_str()),
            Segment::Index(index) => current.get(*index),
        })
}

/// Text substituted for a selected value: strings without quotes, everything
/// else as compact JSON.
pub(crate) fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
