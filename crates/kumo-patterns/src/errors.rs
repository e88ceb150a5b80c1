//! Error types shared by the expression parsing modules.

use std::fmt;
use thiserror::Error;

/// Additional context for placeholder and syntax errors in step expressions.
///
/// # Examples
/// ```
/// use kumo_patterns::PlaceholderErrorInfo;
/// let info = PlaceholderErrorInfo::new("invalid placeholder", 3, Some("value".into()));
/// assert_eq!(info.placeholder.as_deref(), Some("value"));
/// assert_eq!(info.position, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderErrorInfo {
    /// Short description of the failure.
    pub message: &'static str,
    /// Zero-based byte offset of the offending construct.
    pub position: usize,
    /// Placeholder name when the failure concerns a placeholder.
    pub placeholder: Option<String>,
}

impl PlaceholderErrorInfo {
    /// Create a new error description for a syntax failure.
    ///
    /// # Examples
    /// ```
    /// use kumo_patterns::PlaceholderErrorInfo;
    /// let info = PlaceholderErrorInfo::new("invalid", 1, None);
    /// assert_eq!(info.message, "invalid");
    /// ```
    #[must_use]
    pub fn new(message: &'static str, position: usize, placeholder: Option<String>) -> Self {
        Self {
            message,
            position,
            placeholder,
        }
    }
}

impl fmt::Display for PlaceholderErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.placeholder {
            Some(name) => write!(
                f,
                "{} for placeholder `{}` at byte {} (zero-based)",
                self.message, name, self.position
            ),
            None => write!(f, "{} at byte {} (zero-based)", self.message, self.position),
        }
    }
}

/// Errors surfaced while converting step expressions into regular expressions.
///
/// # Examples
/// ```
/// use kumo_patterns::{PatternError, PlaceholderErrorInfo};
/// let info = PlaceholderErrorInfo::new("invalid", 2, Some("count".into()));
/// let err = PatternError::Placeholder(info.clone());
/// assert_eq!(err.to_string(), info.to_string());
/// ```
#[derive(Debug, Error)]
pub enum PatternError {
    /// The expression is syntactically malformed.
    #[error("{0}")]
    Placeholder(PlaceholderErrorInfo),
    /// A placeholder names a data type the caller does not know.
    #[error("unknown argument type `{type_name}` at byte {position} (zero-based)")]
    UnknownType {
        /// Name of the missing type.
        type_name: String,
        /// Zero-based byte offset of the placeholder.
        position: usize,
    },
    /// The generated regular expression failed to compile.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

pub(crate) fn placeholder_error(
    message: &'static str,
    position: usize,
    placeholder: Option<String>,
) -> PatternError {
    PatternError::Placeholder(PlaceholderErrorInfo::new(message, position, placeholder))
}
