use crate::error::DomainError;
use std::fmt;

/// Number of rows and columns on a board.
pub const BOARD_SIZE: u8 = 10;

const COLUMNS: &[u8; BOARD_SIZE as usize] = b"abcdefghij";

/// A coordinate on the 10x10 grid. Stored zero-based; rendered as `<column letter><row number>`
/// so that `(row 0, col 0)` is `a1` and `(row 9, col 9)` is `j10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    row: u8,
    col: u8,
}

impl Cell {
    pub fn new(row: u8, col: u8) -> Option<Self> {
        (row < BOARD_SIZE && col < BOARD_SIZE).then_some(Self { row, col })
    }

    /// Builds a cell from a client move: a column letter (`a`..`j`, any case) and a 1-based row.
    pub fn from_move(letter: char, number: u8) -> Option<Self> {
        let letter = letter.to_ascii_lowercase();
        let col = COLUMNS.iter().position(|c| *c as char == letter)?;
        let row = number.checked_sub(1)?;
        Self::new(row, col as u8)
    }

    #[inline]
    pub fn row(&self) -> u8 {
        self.row
    }

    #[inline]
    pub fn col(&self) -> u8 {
        self.col
    }

    /// Canonical string id, e.g. `c5`.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", COLUMNS[self.col as usize] as char, self.row + 1)
    }
}

impl core::str::FromStr for Cell {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::Validation {
            field: "cell",
            message: format!("'{s}' is not a cell between a1 and j10"),
        };

        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(invalid)?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let number: u8 = digits.parse().map_err(|_| invalid())?;

        Cell::from_move(letter, number).ok_or_else(invalid)
    }
}

/// Canonical cell id for a zero-based `(row, col)` pair.
pub fn cell_id(row: u8, col: u8) -> String {
    format!("{}{}", COLUMNS[col as usize] as char, row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn cell_id_corners() {
        assert_eq!(cell_id(0, 0), "a1");
        assert_eq!(cell_id(0, 9), "j1");
        assert_eq!(cell_id(9, 0), "a10");
        assert_eq!(cell_id(9, 9), "j10");
        assert_eq!(cell_id(4, 2), "c5");
    }

    #[test]
    fn cell_id_is_a_bijection() {
        let mut seen = HashSet::new();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let id = cell_id(row, col);
                let back: Cell = id.parse().expect("generated id parses");
                assert_eq!((back.row(), back.col()), (row, col));
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn from_move_accepts_upper_case() {
        assert_eq!(Cell::from_move('C', 5).unwrap().id(), "c5");
        assert_eq!(Cell::from_move('j', 10).unwrap().id(), "j10");
    }

    #[test]
    fn from_move_rejects_off_grid() {
        assert!(Cell::from_move('k', 1).is_none());
        assert!(Cell::from_move('a', 0).is_none());
        assert!(Cell::from_move('a', 11).is_none());
    }

    #[test]
    fn parse_rejects_garbage() {
        for s in ["", "a", "1a", "a0", "a11", "k3", "a+1", "aa1"] {
            assert!(s.parse::<Cell>().is_err(), "{s} should not parse");
        }
    }
}
