//! Normalized trigger keys.
//!
//! [`Trigger`] enforces its invariants at construction time: the contained
//! string is trimmed, lower-cased, and non-empty. Map building and lookup both
//! go through the same constructor, so the two sides can never disagree on
//! normalization.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("trigger must not be empty after normalization")]
pub struct EmptyTriggerError;

/// A scripted-reply key, normalized for lookup.
///
/// # Invariants
///
/// - Content is trimmed and lower-cased
/// - Content is never empty
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trigger(String);

impl Trigger {
    pub fn new(raw: &str) -> Result<Self, EmptyTriggerError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            Err(EmptyTriggerError)
        } else {
            Ok(Self(normalized))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Trigger {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let trigger = Trigger::new("  Мяу ").unwrap();
        assert_eq!(trigger.as_str(), "мяу");
    }

    #[test]
    fn equal_after_normalization() {
        assert_eq!(Trigger::new("МЯУ").unwrap(), Trigger::new("мяу").unwrap());
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(Trigger::new(""), Err(EmptyTriggerError));
        assert_eq!(Trigger::new("   \t"), Err(EmptyTriggerError));
    }
}
