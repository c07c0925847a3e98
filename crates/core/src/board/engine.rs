//! Turns the tokens of a submitted article into cell updates.

use std::{cmp::Ordering, collections::HashMap, fmt};

use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use super::{Board, Position};
use crate::words::{Word, WordPool, WordPoolError};

/// Audit record for one distinct matched word in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchEvent {
    /// The word that matched (the word that was on the cell before any replacement).
    pub word: Word,
    /// Cell the word occupied.
    pub position: Position,
    /// Count before this submission.
    pub previous_count: u32,
    /// Number of occurrences in the submission.
    pub delta: u32,
    /// `previous_count + delta`, before any overflow reset.
    pub new_count: u32,
    /// Limit of the cell.
    pub limit: u32,
    /// Whether `new_count` reached the limit.
    pub overflowed: bool,
    /// Word that took the cell over after an overflow.
    pub replacement: Option<Word>,
    /// The overflow found no unused word to swap in.
    pub pool_exhausted: bool,
}

impl MatchEvent {
    /// Human-readable lines for the message log.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![self.to_string()];
        if self.overflowed {
            match &self.replacement {
                Some(word) => lines.push(format!("  OVERFLOW > {word}")),
                None => lines.push("  OVERFLOW (no replacement word available)".to_string()),
            }
        }
        lines
    }
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({})+{} = {}/{}",
            self.word, self.previous_count, self.delta, self.new_count, self.limit
        )
    }
}

/// Stateless matcher applying token batches to a [`Board`].
pub struct MatchEngine;

impl MatchEngine {
    /// Apply `tokens` to `board`, drawing overflow replacements from `pool`.
    pub fn apply<I, S>(board: &mut Board, pool: &WordPool, tokens: I) -> Vec<MatchEvent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::apply_with(board, pool, tokens, &mut rand::rng())
    }

    /// [`MatchEngine::apply`] with a caller-supplied RNG for replacement draws.
    ///
    /// Matched words are processed by descending frequency, then ascending word,
    /// and one event is returned per word in that order.
    pub fn apply_with<I, S, R>(
        board: &mut Board,
        pool: &WordPool,
        tokens: I,
        rng: &mut R,
    ) -> Vec<MatchEvent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let mut ordered: Vec<(Word, Position, u32)> = count_matches(board, tokens)
            .into_iter()
            .map(|(word, (position, frequency))| (word, position, frequency))
            .collect();
        ordered.sort_by(|a, b| match b.2.cmp(&a.2) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });

        let mut events = Vec::with_capacity(ordered.len());
        for (word, position, delta) in ordered {
            let Some(cell) = board.cell_mut(position) else {
                continue;
            };
            let previous_count = cell.count;
            let limit = cell.limit;
            let new_count = previous_count.saturating_add(delta);

            let mut event = MatchEvent {
                word,
                position,
                previous_count,
                delta,
                new_count,
                limit,
                overflowed: false,
                replacement: None,
                pool_exhausted: false,
            };

            if new_count < limit {
                cell.count = new_count;
            } else {
                cell.count = 0;
                event.overflowed = true;
                let drawn = {
                    let in_use = board.words();
                    pool.draw_unique_with(&in_use, &mut *rng)
                };
                let (replacement, pool_exhausted) =
                    install_replacement(board, position, &event.word, drawn);
                event.replacement = replacement;
                event.pool_exhausted = pool_exhausted;
            }

            debug!(
                word = %event.word,
                previous = event.previous_count,
                delta = event.delta,
                limit = event.limit,
                overflowed = event.overflowed,
                "Cell updated"
            );
            events.push(event);
        }
        events
    }
}

/// Put a drawn replacement on the overflowed cell at `position`.
///
/// Returns the word now on the cell, or `None` with the exhausted flag set when
/// the old word has to stay.
fn install_replacement(
    board: &mut Board,
    position: Position,
    word: &Word,
    drawn: Result<Word, WordPoolError>,
) -> (Option<Word>, bool) {
    match drawn {
        Ok(replacement) => match board.replace_word(position, replacement.clone()) {
            Ok(_) => (Some(replacement), false),
            Err(err) => {
                warn!(word = %word, %err, "Replacement could not be placed");
                (None, true)
            }
        },
        Err(WordPoolError::Exhausted { total }) => {
            warn!(word = %word, total, "No replacement word left after overflow");
            (None, true)
        }
        Err(err) => {
            warn!(word = %word, %err, "Replacement draw failed");
            (None, true)
        }
    }
}

/// Frequency of each on-board word among `tokens`, keyed by word.
fn count_matches<I, S>(board: &Board, tokens: I) -> HashMap<Word, (Position, u32)>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<Word, (Position, u32)> = HashMap::new();
    for token in tokens {
        let Some(word) = Word::new(token.as_ref()) else {
            continue;
        };
        let Some(position) = board.find(&word) else {
            continue;
        };
        counts.entry(word).or_insert((position, 0)).1 += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::tests::{animals, words};
    use crate::board::WinDetector;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn animal_pool() -> WordPool {
        WordPool::from_words([
            "cat", "owl", "elk", "yak", "emu", "gnu", "ant", "bee", "cod", "fox", "hen", "pig",
        ])
        .expect("pool")
    }

    fn set_count(board: &mut Board, word: &str, count: u32) {
        let position = board.find(word).expect("word on board");
        board.cell_mut(position).expect("cell").count = count;
    }

    #[test]
    fn overflow_resets_count_and_replaces_word() {
        let pool = animal_pool();
        let mut board = animals();
        set_count(&mut board, "cat", 2);
        let mut rng = StdRng::seed_from_u64(1);

        let events = MatchEngine::apply_with(&mut board, &pool, ["Cat", "cat", "dog"], &mut rng);

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.word.as_str(), "cat");
        assert_eq!(event.position, Position::new(0, 0));
        assert_eq!(event.previous_count, 2);
        assert_eq!(event.delta, 2);
        assert_eq!(event.new_count, 4);
        assert!(event.overflowed);
        assert!(!event.pool_exhausted);

        let replacement = event.replacement.clone().expect("replacement word");
        assert!(["fox", "hen", "pig"].contains(&replacement.as_str()));
        let cell = board.cell(Position::new(0, 0)).expect("cell");
        assert_eq!(cell.word, replacement);
        assert_eq!(cell.count, 0);
        assert_eq!(cell.limit, 3);
        assert!(board.find("cat").is_none());
        assert_eq!(board.words().len(), 9);
    }

    #[test]
    fn exhausted_pool_keeps_the_word() {
        let pool = WordPool::from_words(["sun", "moon", "star", "comet"]).expect("pool");
        let mut board =
            Board::from_words(2, 3, words(&["sun", "moon", "star", "comet"])).expect("board");

        let events = MatchEngine::apply(&mut board, &pool, ["sun", "SUN", "sun", "moon"]);

        assert_eq!(events.len(), 2);
        let sun = &events[0];
        assert_eq!(sun.word.as_str(), "sun");
        assert!(sun.overflowed);
        assert!(sun.pool_exhausted);
        assert_eq!(sun.replacement, None);
        let cell = board.cell(Position::new(0, 0)).expect("cell");
        assert_eq!(cell.word.as_str(), "sun");
        assert_eq!(cell.count, 0);
        assert_eq!(
            sun.summary_lines(),
            vec![
                "sun (0)+3 = 3/3".to_string(),
                "  OVERFLOW (no replacement word available)".to_string()
            ]
        );

        assert_eq!(events[1].word.as_str(), "moon");
        assert!(!events[1].overflowed);
        assert_eq!(board.cell(Position::new(0, 1)).expect("cell").count, 1);
    }

    #[test]
    fn unplaceable_replacement_keeps_the_word_and_flags_the_event() {
        let mut board = animals();
        let cat = Word::new("cat").expect("word");
        let owl = Word::new("owl").expect("word");

        let (replacement, exhausted) =
            install_replacement(&mut board, Position::new(0, 0), &cat, Ok(owl));

        assert_eq!(replacement, None);
        assert!(exhausted);
        assert_eq!(board.find("cat"), Some(Position::new(0, 0)));
        assert_eq!(board.find("owl"), Some(Position::new(0, 1)));

        let (replacement, exhausted) = install_replacement(
            &mut board,
            Position::new(0, 0),
            &cat,
            Err(WordPoolError::Exhausted { total: 9 }),
        );
        assert_eq!(replacement, None);
        assert!(exhausted);
    }

    #[test]
    fn events_are_ordered_by_frequency_then_word() {
        let pool = animal_pool();
        let mut board = animals();
        let events = MatchEngine::apply(
            &mut board,
            &pool,
            ["yak", "bee", "ant", "bee", "owl", "owl"],
        );
        let order: Vec<&str> = events.iter().map(|event| event.word.as_str()).collect();
        assert_eq!(order, vec!["bee", "owl", "ant", "yak"]);
    }

    #[test]
    fn empty_submission_is_a_no_op() {
        let pool = animal_pool();
        let mut board = animals();
        set_count(&mut board, "emu", 1);
        let before = board.clone();

        let events = MatchEngine::apply(&mut board, &pool, Vec::<String>::new());

        assert!(events.is_empty());
        assert_eq!(board.cells(), before.cells());
        for cell in before.cells() {
            assert_eq!(board.find(&cell.word), before.find(&cell.word));
        }
    }

    #[test]
    fn repeated_runs_produce_identical_events() {
        let pool = animal_pool();
        let tokens = ["cat", "cat", "cat", "owl", "gnu", "gnu", "gnu", "gnu", "bee"];

        let mut first = animals();
        let mut second = animals();
        let a = MatchEngine::apply_with(&mut first, &pool, tokens, &mut StdRng::seed_from_u64(9));
        let b = MatchEngine::apply_with(&mut second, &pool, tokens, &mut StdRng::seed_from_u64(9));

        assert_eq!(a, b);
        assert_eq!(first.cells(), second.cells());
    }

    #[test]
    fn row_win_survives_unrelated_matches() {
        let pool = animal_pool();
        let mut board = animals();
        MatchEngine::apply(&mut board, &pool, ["cat", "owl", "elk"]);
        assert!(WinDetector::check(&board));

        MatchEngine::apply(&mut board, &pool, ["ant", "bee"]);
        assert!(WinDetector::check(&board));
    }

    proptest! {
        #[test]
        fn invariants_hold_across_submissions(
            batches in prop::collection::vec(
                prop::collection::vec(
                    prop::sample::select(vec![
                        "cat", "owl", "elk", "yak", "emu", "gnu", "ant", "bee", "cod", "fox",
                        "hen", "pig", "Dog", "CAT",
                    ]),
                    0..12,
                ),
                1..8,
            ),
            seed in any::<u64>(),
        ) {
            let pool = animal_pool();
            let mut board = animals();
            let mut rng = StdRng::seed_from_u64(seed);

            for batch in batches {
                MatchEngine::apply_with(&mut board, &pool, batch, &mut rng);

                prop_assert_eq!(board.words().len(), board.cells().len());
                for (offset, cell) in board.cells().iter().enumerate() {
                    prop_assert!(cell.count < cell.limit);
                    prop_assert_eq!(
                        board.find(&cell.word),
                        Some(Position::new(offset / 3, offset % 3))
                    );
                }
            }
        }
    }
}
