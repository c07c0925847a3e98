//! Row and column win detection.

use serde::Serialize;

use super::{Board, Position};

/// A completed line on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WinningLine {
    /// Every cell in this row has a positive count.
    Row(usize),
    /// Every cell in this column has a positive count.
    Column(usize),
}

impl WinningLine {
    /// Whether `position` lies on this line.
    pub fn contains(&self, position: Position) -> bool {
        match self {
            WinningLine::Row(row) => position.row == *row,
            WinningLine::Column(col) => position.col == *col,
        }
    }
}

/// Pure checks over a [`Board`]'s counts.
pub struct WinDetector;

impl WinDetector {
    /// True when any full row or full column has every count above zero.
    pub fn check(board: &Board) -> bool {
        (0..board.size()).any(|line| row_complete(board, line) || column_complete(board, line))
    }

    /// Every completed row, then every completed column.
    pub fn winning_lines(board: &Board) -> Vec<WinningLine> {
        let rows = (0..board.size())
            .filter(|&row| row_complete(board, row))
            .map(WinningLine::Row);
        let columns = (0..board.size())
            .filter(|&col| column_complete(board, col))
            .map(WinningLine::Column);
        rows.chain(columns).collect()
    }
}

fn row_complete(board: &Board, row: usize) -> bool {
    (0..board.size()).all(|col| hit(board, Position::new(row, col)))
}

fn column_complete(board: &Board, col: usize) -> bool {
    (0..board.size()).all(|row| hit(board, Position::new(row, col)))
}

fn hit(board: &Board, position: Position) -> bool {
    board.cell(position).map(|cell| cell.count > 0).unwrap_or(false)
}
