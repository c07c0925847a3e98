use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    board::{Board, BoardError, MatchEngine, MatchEvent, WinDetector},
    config::GameOptions,
    tokenizer::{ArticleTokenizer, Cancellation, TokenizeError},
    words::WordPool,
};

/// Message shown when the tokenizer produced nothing for a title.
pub const NOT_FOUND_MESSAGE: &str = "Article not found";
/// Message shown when no token matched the board.
pub const NO_MATCHES_MESSAGE: &str = "No valid words";

/// Submissions a session refuses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The board already has a winning line; the session only awaits a name.
    #[error("the game is already won")]
    AlreadyWon,
}

/// What a single submission did to the session.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    /// One event per matched word, in processing order.
    pub events: Vec<MatchEvent>,
    /// Why the article produced no tokens, if it did not.
    pub fetch_error: Option<TokenizeError>,
    /// Whether this submission completed a line.
    pub won: bool,
}

/// A play-through: board, score, last turn's messages and win state.
#[derive(Debug, Clone)]
pub struct GameSession {
    pool: Arc<WordPool>,
    options: GameOptions,
    board: Board,
    score: u32,
    messages: Vec<String>,
    won: bool,
    last_title: Option<String>,
}

impl GameSession {
    /// Start a session on a freshly built board.
    pub fn new(pool: Arc<WordPool>, options: GameOptions) -> Result<Self, BoardError> {
        let board = Board::build(options.board_size, options.limit, &pool)?;
        Ok(Self::with_board(pool, options, board))
    }

    /// Start a session on an existing board.
    pub fn with_board(pool: Arc<WordPool>, options: GameOptions, board: Board) -> Self {
        Self {
            pool,
            options,
            board,
            score: 0,
            messages: Vec::new(),
            won: false,
            last_title: None,
        }
    }

    /// Throw the board away and start over with the same options.
    ///
    /// The new board is built before the old one is dropped, so a failed build
    /// leaves the current game untouched.
    pub fn restart(&mut self) -> Result<(), BoardError> {
        let board = Board::build(self.options.board_size, self.options.limit, &self.pool)?;
        self.board = board;
        self.score = 0;
        self.messages.clear();
        self.won = false;
        self.last_title = None;
        info!(
            size = self.options.board_size,
            limit = self.options.limit,
            "Session restarted"
        );
        Ok(())
    }

    /// Fetch `title` through `tokenizer` and apply it.
    pub fn submit<T>(
        &mut self,
        title: &str,
        tokenizer: &T,
        cancellation: &Cancellation,
    ) -> Result<SubmissionOutcome, SessionError>
    where
        T: ArticleTokenizer + ?Sized,
    {
        if self.won {
            return Err(SessionError::AlreadyWon);
        }
        let fetched = cancellation
            .check()
            .and_then(|()| tokenizer.fetch_and_tokenize(title, cancellation))
            .and_then(|tokens| cancellation.check().map(|()| tokens));
        self.record(title, fetched)
    }

    /// Apply an already fetched article.
    ///
    /// Every accepted submission costs one point of score, whether or not the
    /// article was found or matched anything. The message log is replaced with
    /// this turn's lines.
    pub fn record(
        &mut self,
        title: &str,
        fetched: Result<Vec<String>, TokenizeError>,
    ) -> Result<SubmissionOutcome, SessionError> {
        if self.won {
            return Err(SessionError::AlreadyWon);
        }

        let title = title.trim();
        self.score = self.score.saturating_add(1);
        let mut messages = vec![format!("{title}:")];

        let (tokens, fetch_error) = match fetched {
            Ok(tokens) => (tokens, None),
            Err(err) => {
                warn!(title, %err, "Article unavailable");
                messages.push(NOT_FOUND_MESSAGE.to_string());
                (Vec::new(), Some(err))
            }
        };

        let events = MatchEngine::apply(&mut self.board, &self.pool, &tokens);
        if events.is_empty() {
            messages.push(NO_MATCHES_MESSAGE.to_string());
        }
        for event in &events {
            messages.extend(event.summary_lines());
        }

        self.messages = messages;
        self.last_title = Some(title.to_string());
        if WinDetector::check(&self.board) {
            self.won = true;
            info!(score = self.score, "Board won");
        }

        Ok(SubmissionOutcome {
            events,
            fetch_error,
            won: self.won,
        })
    }

    /// The board being played.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Size and limit this session was started with.
    pub fn options(&self) -> GameOptions {
        self.options
    }

    /// Submissions made so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Lines describing the most recent submission.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Once true, stays true until [`GameSession::restart`].
    pub fn is_won(&self) -> bool {
        self.won
    }

    /// Title of the most recent submission, trimmed.
    pub fn last_title(&self) -> Option<&str> {
        self.last_title.as_deref()
    }
}
