#![warn(clippy::all, missing_docs)]

//! Core game logic for Wiki Bingo.
//!
//! This crate hosts the word pool, the board and its match engine, win
//! detection, game sessions, configuration handling, the article tokenizer
//! and leaderboard persistence used by the terminal UI and any future
//! frontends.

pub mod board;
pub mod config;
pub mod leaderboard;
pub mod session;
pub mod tokenizer;
pub mod words;

pub use board::{
    Board, BoardError, Cell, MatchEngine, MatchEvent, Position, WinDetector, WinningLine,
};
pub use config::{AppConfig, Difficulty, GameOptions};
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use session::{GameSession, SessionError, SubmissionOutcome};
pub use tokenizer::{ArticleTokenizer, Cancellation, TokenizeError, WikipediaTokenizer};
pub use words::{Word, WordPool, WordPoolError};
