//! Game sessions: one play-through from a fresh board to a win.

mod game;

pub use game::{
    GameSession, SessionError, SubmissionOutcome, NOT_FOUND_MESSAGE, NO_MATCHES_MESSAGE,
};
