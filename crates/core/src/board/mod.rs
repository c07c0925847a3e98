//! The bingo grid, the match engine that mutates it and the win detector.

pub mod engine;
pub mod win;

use std::{
    collections::{HashMap, HashSet},
    fmt,
};

use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::words::{Word, WordPool, WordPoolError};

pub use engine::{MatchEngine, MatchEvent};
pub use win::{WinDetector, WinningLine};

/// Zero-based `(row, col)` grid address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    /// Row index, counted from the top.
    pub row: usize,
    /// Column index, counted from the left.
    pub col: usize,
}

impl Position {
    /// Address the cell at `row`, `col`.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One grid square: a target word, its hit count and its overflow threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    /// Target word.
    pub word: Word,
    /// Hits absorbed since the last overflow.
    pub count: u32,
    /// Hits needed to overflow.
    pub limit: u32,
}

impl Cell {
    /// Which of `bands` equal slices of the limit the count has reached.
    ///
    /// An untouched cell is band 0; a cell one hit short of overflowing is
    /// band `bands - 1`.
    pub fn fill_band(&self, bands: u32) -> u32 {
        self.count.saturating_mul(bands) / self.limit.max(1)
    }
}

/// Errors raised while building or editing a [`Board`].
#[derive(Debug, Error)]
pub enum BoardError {
    /// A board needs at least one row.
    #[error("board size must be at least 1")]
    InvalidSize,
    /// A cell needs a positive limit.
    #[error("cell limit must be at least 1")]
    InvalidLimit,
    /// The address does not exist on this board.
    #[error("position {position} is outside a {size}x{size} board")]
    OutOfBounds {
        /// Requested address.
        position: Position,
        /// Side length of the board.
        size: usize,
    },
    /// Words must stay unique across the grid.
    #[error("'{0}' is already on the board")]
    DuplicateWord(Word),
    /// The vocabulary could not supply enough words.
    #[error(transparent)]
    Pool(#[from] WordPoolError),
}

/// Square grid of cells with a word → position index kept in step with it.
#[derive(Debug, Clone)]
pub struct Board {
    size: usize,
    cells: Vec<Cell>,
    index: HashMap<Word, Position>,
}

impl Board {
    /// Build a `size`×`size` board of unique words, all sharing `limit`.
    pub fn build(size: usize, limit: u32, pool: &WordPool) -> Result<Self, BoardError> {
        Self::build_with(size, limit, pool, &mut rand::rng())
    }

    /// [`Board::build`] with a caller-supplied RNG.
    pub fn build_with<R: Rng + ?Sized>(
        size: usize,
        limit: u32,
        pool: &WordPool,
        rng: &mut R,
    ) -> Result<Self, BoardError> {
        if size == 0 {
            return Err(BoardError::InvalidSize);
        }
        if limit == 0 {
            return Err(BoardError::InvalidLimit);
        }

        let total = size * size;
        let mut drawn: HashSet<Word> = HashSet::with_capacity(total);
        let mut words = Vec::with_capacity(total);
        for _ in 0..total {
            let word = pool.draw_unique_with(&drawn, &mut *rng)?;
            drawn.insert(word.clone());
            words.push(word);
        }

        let board = Self::from_words(size, limit, words)?;
        info!(size, limit, "Board built");
        Ok(board)
    }

    /// Lay out `words` row-major. `words` must hold exactly `size * size` distinct entries.
    pub fn from_words(
        size: usize,
        limit: u32,
        words: impl IntoIterator<Item = Word>,
    ) -> Result<Self, BoardError> {
        if size == 0 {
            return Err(BoardError::InvalidSize);
        }
        if limit == 0 {
            return Err(BoardError::InvalidLimit);
        }

        let mut cells = Vec::with_capacity(size * size);
        let mut index = HashMap::with_capacity(size * size);
        for (offset, word) in words.into_iter().enumerate() {
            let position = Position::new(offset / size, offset % size);
            if position.row >= size {
                return Err(BoardError::OutOfBounds { position, size });
            }
            if index.insert(word.clone(), position).is_some() {
                return Err(BoardError::DuplicateWord(word));
            }
            cells.push(Cell {
                word,
                count: 0,
                limit,
            });
        }
        if cells.len() != size * size {
            return Err(BoardError::OutOfBounds {
                position: Position::new(cells.len() / size, cells.len() % size),
                size,
            });
        }

        Ok(Self { size, cells, index })
    }

    /// Side length of the grid.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Look up a word's position; the input is normalized first.
    pub fn find(&self, word: &str) -> Option<Position> {
        let needle = crate::words::normalize(word);
        self.index.get(needle.as_str()).copied()
    }

    /// Whether the (normalized) word is on the board.
    pub fn contains(&self, word: &str) -> bool {
        self.find(word).is_some()
    }

    /// Cell at `position`, if it exists.
    pub fn cell(&self, position: Position) -> Option<&Cell> {
        self.offset(position).map(|offset| &self.cells[offset])
    }

    pub(crate) fn cell_mut(&mut self, position: Position) -> Option<&mut Cell> {
        self.offset(position).map(move |offset| &mut self.cells[offset])
    }

    /// All cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterate the grid one row at a time.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size)
    }

    /// The set of words currently placed on the board.
    pub fn words(&self) -> HashSet<&str> {
        self.index.keys().map(|word| word.as_str()).collect()
    }

    /// Swap the word at `position`, updating the index in the same call.
    ///
    /// The cell keeps its count and limit; the caller decides whether to reset them.
    pub fn replace_word(&mut self, position: Position, new_word: Word) -> Result<Word, BoardError> {
        let size = self.size;
        let offset = self
            .offset(position)
            .ok_or(BoardError::OutOfBounds { position, size })?;
        if self.cells[offset].word == new_word {
            return Ok(new_word);
        }
        if self.index.contains_key(&new_word) {
            return Err(BoardError::DuplicateWord(new_word));
        }

        let old = std::mem::replace(&mut self.cells[offset].word, new_word.clone());
        self.index.remove(&old);
        self.index.insert(new_word, position);
        Ok(old)
    }

    fn offset(&self, position: Position) -> Option<usize> {
        if position.row < self.size && position.col < self.size {
            Some(position.row * self.size + position.col)
        } else {
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    pub(crate) fn words(list: &[&str]) -> Vec<Word> {
        list.iter()
            .map(|raw| Word::new(raw).expect("test word"))
            .collect()
    }

    pub(crate) fn animals() -> Board {
        Board::from_words(
            3,
            3,
            words(&[
                "cat", "owl", "elk", "yak", "emu", "gnu", "ant", "bee", "cod",
            ]),
        )
        .expect("board")
    }

    fn assert_index_consistent(board: &Board) {
        assert_eq!(board.index.len(), board.cells.len());
        for (offset, cell) in board.cells.iter().enumerate() {
            let expected = Position::new(offset / board.size, offset % board.size);
            assert_eq!(board.find(&cell.word), Some(expected));
        }
    }

    #[test]
    fn build_draws_unique_words() {
        let pool = WordPool::from_words((0..60).map(|n| format!("word{n}"))).expect("pool");
        let mut rng = StdRng::seed_from_u64(42);
        let board = Board::build_with(7, 5, &pool, &mut rng).expect("board");

        assert_eq!(board.size(), 7);
        assert_eq!(board.cells().len(), 49);
        assert_eq!(board.words().len(), 49);
        assert!(board.cells().iter().all(|cell| cell.count == 0 && cell.limit == 5));
        assert_index_consistent(&board);
    }

    #[test]
    fn build_fails_when_vocabulary_is_too_small() {
        let pool = WordPool::from_words(["a", "b", "c"]).expect("pool");
        let result = Board::build(2, 3, &pool);
        assert!(matches!(
            result,
            Err(BoardError::Pool(WordPoolError::Exhausted { total: 3 }))
        ));
    }

    #[test]
    fn build_can_use_the_whole_vocabulary() {
        let pool = WordPool::from_words(["sun", "moon", "star", "comet"]).expect("pool");
        let mut rng = StdRng::seed_from_u64(3);
        let board = Board::build_with(2, 3, &pool, &mut rng).expect("board");

        let mut placed: Vec<&str> = board.cells().iter().map(|cell| cell.word.as_str()).collect();
        placed.sort_unstable();
        assert_eq!(placed, vec!["comet", "moon", "star", "sun"]);
        assert_index_consistent(&board);
        assert!(matches!(
            pool.draw_unique(&board.words()),
            Err(WordPoolError::Exhausted { total: 4 })
        ));
    }

    #[test]
    fn build_rejects_degenerate_dimensions() {
        let pool = WordPool::from_words(["a", "b"]).expect("pool");
        assert!(matches!(Board::build(0, 3, &pool), Err(BoardError::InvalidSize)));
        assert!(matches!(Board::build(1, 0, &pool), Err(BoardError::InvalidLimit)));
    }

    #[test]
    fn find_is_case_insensitive() {
        let board = animals();
        assert_eq!(board.find("CAT"), Some(Position::new(0, 0)));
        assert_eq!(board.find(" bee "), Some(Position::new(2, 1)));
        assert_eq!(board.find("dog"), None);
        assert!(board.contains("Owl"));
        assert!(!board.contains("dog"));
    }

    #[test]
    fn replace_word_keeps_index_in_step() {
        let mut board = animals();
        let old = board
            .replace_word(Position::new(1, 1), Word::new("fox").expect("word"))
            .expect("replace");

        assert_eq!(old.as_str(), "emu");
        assert_eq!(board.find("fox"), Some(Position::new(1, 1)));
        assert_eq!(board.find("emu"), None);
        assert_index_consistent(&board);
    }

    #[test]
    fn replace_word_rejects_duplicates_and_bad_positions() {
        let mut board = animals();
        let duplicate = board.replace_word(Position::new(0, 0), Word::new("owl").expect("word"));
        assert!(matches!(duplicate, Err(BoardError::DuplicateWord(_))));

        let outside = board.replace_word(Position::new(3, 0), Word::new("fox").expect("word"));
        assert!(matches!(outside, Err(BoardError::OutOfBounds { .. })));
        assert_index_consistent(&board);
    }

    #[test]
    fn from_words_requires_a_full_grid() {
        assert!(Board::from_words(2, 3, words(&["a", "b", "c"])).is_err());
        assert!(Board::from_words(2, 3, words(&["a", "b", "c", "a"])).is_err());
        assert!(Board::from_words(1, 3, words(&["a", "b"])).is_err());
    }

    #[test]
    fn fill_band_splits_the_limit_evenly() {
        let cell = |count, limit| Cell {
            word: Word::new("cat").expect("word"),
            count,
            limit,
        };
        assert_eq!(cell(0, 3).fill_band(3), 0);
        assert_eq!(cell(1, 3).fill_band(3), 1);
        assert_eq!(cell(2, 3).fill_band(3), 2);
        assert_eq!(cell(2, 7).fill_band(3), 0);
        assert_eq!(cell(6, 7).fill_band(3), 2);
    }
}
