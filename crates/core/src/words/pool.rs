use std::{
    borrow::Borrow,
    collections::{BTreeSet, HashSet},
    fs,
    hash::Hash,
    path::{Path, PathBuf},
};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use super::Word;

/// Failures raised while loading or drawing from the vocabulary.
#[derive(Debug, Error)]
pub enum WordPoolError {
    /// The vocabulary file could not be read.
    #[error("failed to read vocabulary {path}: {source}")]
    Load {
        /// Location that was read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The vocabulary contained no usable words.
    #[error("vocabulary is empty")]
    Empty,
    /// Every candidate word is already excluded.
    #[error("no unused words left in a pool of {total}")]
    Exhausted {
        /// Size of the candidate set.
        total: usize,
    },
}

/// Read-only master vocabulary shared by every session in the process.
#[derive(Debug, Clone)]
pub struct WordPool {
    candidates: Vec<Word>,
}

impl WordPool {
    /// Load a newline-delimited vocabulary file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WordPoolError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| WordPoolError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let pool = Self::from_words(content.lines())?;
        info!(path = %path.display(), words = pool.len(), "Vocabulary loaded");
        Ok(pool)
    }

    /// Build a pool from in-memory entries, normalizing and deduplicating them.
    pub fn from_words<I, S>(entries: I) -> Result<Self, WordPoolError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<Word> = entries
            .into_iter()
            .filter_map(|entry| Word::new(entry.as_ref()))
            .collect();
        if unique.is_empty() {
            return Err(WordPoolError::Empty);
        }
        Ok(Self {
            candidates: unique.into_iter().collect(),
        })
    }

    /// Number of distinct candidate words.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Always false for a successfully built pool.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Whether `word` (normalized before comparison) is a candidate.
    pub fn contains(&self, word: &str) -> bool {
        let needle = super::word::normalize(word);
        self.candidates
            .binary_search_by(|candidate| candidate.as_str().cmp(needle.as_str()))
            .is_ok()
    }

    /// All candidates in ascending order.
    pub fn words(&self) -> &[Word] {
        &self.candidates
    }

    /// Draw a word not present in `excluded` using the thread-local RNG.
    pub fn draw_unique<Q>(&self, excluded: &HashSet<Q>) -> Result<Word, WordPoolError>
    where
        Q: Borrow<str> + Eq + Hash,
    {
        self.draw_unique_with(excluded, &mut rand::rng())
    }

    /// Draw a word not present in `excluded` using the supplied RNG.
    ///
    /// The available set is computed up front, so an exhausted pool fails
    /// immediately instead of resampling forever.
    pub fn draw_unique_with<Q, R>(
        &self,
        excluded: &HashSet<Q>,
        rng: &mut R,
    ) -> Result<Word, WordPoolError>
    where
        Q: Borrow<str> + Eq + Hash,
        R: Rng + ?Sized,
    {
        let available: Vec<&Word> = self
            .candidates
            .iter()
            .filter(|word| !excluded.contains(word.as_str()))
            .collect();
        if available.is_empty() {
            debug!(excluded = excluded.len(), "Word pool exhausted");
            return Err(WordPoolError::Exhausted {
                total: self.candidates.len(),
            });
        }
        let pick = rng.random_range(0..available.len());
        Ok(available[pick].clone())
    }
}
