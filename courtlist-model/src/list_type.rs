use std::{fmt, str::FromStr};

use crate::error::ModelError;

/// Classification of a court list, e.g. `DAILY_LIST`.
///
/// Stored upper-case with `_` separators so that `daily-list`, `Daily List`
/// and `DAILY_LIST` all name the same list type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct CourtListType(String);

impl CourtListType {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ModelError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidListType(
                "list type must not be empty".to_string(),
            ));
        }

        let mut normalized = String::with_capacity(trimmed.len());
        for ch in trimmed.chars() {
            match ch {
                'a'..='z' | 'A'..='Z' | '0'..='9' => {
                    normalized.push(ch.to_ascii_uppercase())
                }
                '_' | '-' | ' ' => normalized.push('_'),
                other => {
                    return Err(ModelError::InvalidListType(format!(
                        "unexpected character {other:?} in {trimmed:?}"
                    )));
                }
            }
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-case form used to pick a render template.
    pub fn template_key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl FromStr for CourtListType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CourtListType {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CourtListType> for String {
    fn from(value: CourtListType) -> Self {
        value.0
    }
}

impl fmt::Display for CourtListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
