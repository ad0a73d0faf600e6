//! Title validation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// Maximum title length, counted in Unicode scalar values.
pub const MAX_TITLE_CHARS: usize = 150;

/// A validated feature title.
///
/// Holds the text exactly as submitted. A title is valid when it has at least
/// one non-whitespace character and at most [`MAX_TITLE_CHARS`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Title(String);

impl Title {
    /// Validate and wrap a title.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();

        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let len = raw.chars().count();
        if len > MAX_TITLE_CHARS {
            return Err(ValidationError::TitleTooLong {
                len,
                max: MAX_TITLE_CHARS,
            });
        }

        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Title> for String {
    fn from(title: Title) -> Self {
        title.0
    }
}

impl TryFrom<String> for Title {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}
