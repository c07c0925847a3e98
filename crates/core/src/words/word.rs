use std::{borrow::Borrow, fmt, ops::Deref};

use serde::{Deserialize, Serialize};

/// A normalized (trimmed, lowercased, non-empty) word.
///
/// Only normalized forms are ever stored, so plain string equality is the
/// case-insensitive comparison the game needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Word(String);

impl Word {
    /// Normalize `raw`, returning `None` when nothing but whitespace remains.
    pub fn new(raw: &str) -> Option<Self> {
        let normalized = normalize(raw);
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    /// Borrow the normalized text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lowercase and trim a raw token without allocating a [`Word`].
pub(crate) fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl Deref for Word {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Word {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Word {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Word::new(&value).ok_or_else(|| format!("'{value}' is not a usable word"))
    }
}

impl From<Word> for String {
    fn from(word: Word) -> Self {
        word.0
    }
}
