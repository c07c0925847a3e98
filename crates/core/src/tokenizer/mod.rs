//! Article fetching and tokenization collaborators.

mod wikipedia;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub use wikipedia::{WikipediaTokenizer, DEFAULT_API_URL, DEFAULT_TIMEOUT};

/// Reasons a title produced no tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// The title does not resolve to an article.
    #[error("article '{0}' not found")]
    NotFound(String),
    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
    /// The deadline passed before the article arrived.
    #[error("request timed out")]
    TimedOut,
    /// Transport or decoding failure.
    #[error("fetch failed: {0}")]
    Fetch(String),
}

/// Source of word tokens for a submitted title.
pub trait ArticleTokenizer {
    /// Fetch the article named `title` and split it into raw word tokens.
    ///
    /// Implementations should give up with [`TokenizeError::Cancelled`] or
    /// [`TokenizeError::TimedOut`] once `cancellation` fires.
    fn fetch_and_tokenize(
        &self,
        title: &str,
        cancellation: &Cancellation,
    ) -> Result<Vec<String>, TokenizeError>;
}

/// Cancel flag plus optional deadline handed to a tokenizer call.
///
/// Clones share the flag, so the frontend can keep one and cancel from its side.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// A signal that only fires when [`Cancellation::cancel`] is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signal that also fires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    /// Request cancellation for every clone of this signal.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether [`Cancellation::cancel`] was called.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Time left before the deadline, `None` without one.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Fail with the matching error once the signal has fired.
    pub fn check(&self) -> Result<(), TokenizeError> {
        if self.is_cancelled() {
            return Err(TokenizeError::Cancelled);
        }
        if self.remaining() == Some(Duration::ZERO) {
            return Err(TokenizeError::TimedOut);
        }
        Ok(())
    }
}

static WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z]+(?:'[A-Za-z]+)?").expect("failed to compile word token regex")
});

/// Split free text into lowercased word tokens.
pub fn tokenize_text(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|token| token.as_str().to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_text_into_lowercase_words() {
        let tokens = tokenize_text("The Cat's hat, 1984 -- and the DOG!\nnew-line");
        assert_eq!(
            tokens,
            vec!["the", "cat's", "hat", "and", "the", "dog", "new", "line"]
        );
    }

    #[test]
    fn cancellation_is_shared_between_clones() {
        let signal = Cancellation::new();
        let handle = signal.clone();
        assert_eq!(signal.check(), Ok(()));
        handle.cancel();
        assert!(signal.is_cancelled());
        assert_eq!(signal.check(), Err(TokenizeError::Cancelled));
    }

    #[test]
    fn expired_deadline_reports_timeout() {
        let signal = Cancellation::with_timeout(Duration::ZERO);
        assert_eq!(signal.remaining(), Some(Duration::ZERO));
        assert_eq!(signal.check(), Err(TokenizeError::TimedOut));
        assert_eq!(Cancellation::new().remaining(), None);
    }
}
