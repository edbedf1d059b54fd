//! Core value types for the Go board model.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::instrument;

/// Column letters used by GTP and most Go engines (no `I`).
pub const COLUMN_LETTERS: &[u8; 25] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// Largest board the GTP vertex encoding can address.
pub const MAX_BOARD_SIZE: usize = COLUMN_LETTERS.len();

/// Stone color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    /// Black (moves first).
    #[serde(rename = "B", alias = "black", alias = "b")]
    Black,
    /// White.
    #[serde(rename = "W", alias = "white", alias = "w")]
    White,
}

impl Color {
    /// Returns the opposing color.
    pub fn opponent(self) -> Self {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Single-letter GTP/SGF tag.
    pub fn letter(self) -> char {
        match self {
            Color::Black => 'B',
            Color::White => 'W',
        }
    }

    /// Capitalized human-readable name.
    pub fn title(self) -> &'static str {
        match self {
            Color::Black => "Black",
            Color::White => "White",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

impl FromStr for Color {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" | "black" => Ok(Color::Black),
            "w" | "white" => Ok(Color::White),
            _ => Err(ParseMoveError::new(format!("not a color: {s:?}"))),
        }
    }
}

/// An intersection on the board. Row 0 is the bottom row (GTP row 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column, 0 = `A`.
    pub col: u8,
    /// Row, 0 = bottom.
    pub row: u8,
}

impl Point {
    /// Creates a point from zero-based column and row.
    pub fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// Whether the point lies on a board of the given size.
    pub fn is_on_board(self, size: usize) -> bool {
        (self.col as usize) < size && (self.row as usize) < size
    }

    /// Point reflection through the board centre.
    pub fn mirrored(self, size: usize) -> Self {
        let last = (size - 1) as u8;
        Self {
            col: last - self.col,
            row: last - self.row,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = COLUMN_LETTERS
            .get(self.col as usize)
            .map_or('?', |&c| c as char);
        write!(f, "{}{}", letter, self.row as u32 + 1)
    }
}

impl FromStr for Point {
    type Err = ParseMoveError;

    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars
            .next()
            .ok_or_else(|| ParseMoveError::new("empty vertex".to_string()))?
            .to_ascii_uppercase();
        let col = COLUMN_LETTERS
            .iter()
            .position(|&c| c as char == letter)
            .ok_or_else(|| ParseMoveError::new(format!("bad column in vertex {s:?}")))?;

        let digits = chars.as_str();
        if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseMoveError::new(format!("bad row in vertex {s:?}")));
        }
        let row: usize = digits
            .parse()
            .map_err(|_| ParseMoveError::new(format!("bad row in vertex {s:?}")))?;
        if row == 0 || row > MAX_BOARD_SIZE {
            return Err(ParseMoveError::new(format!("row out of range in vertex {s:?}")));
        }

        Ok(Point::new(col as u8, (row - 1) as u8))
    }
}

/// A move: a stone placement or a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Pass.
    Pass,
    /// Stone placed on a point.
    Play(Point),
}

impl Move {
    /// Returns `true` for [`Move::Pass`].
    pub fn is_pass(self) -> bool {
        matches!(self, Move::Pass)
    }

    /// The point played, if any.
    pub fn point(self) -> Option<Point> {
        match self {
            Move::Pass => None,
            Move::Play(p) => Some(p),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Pass => f.write_str("pass"),
            Move::Play(p) => write!(f, "{}", p),
        }
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("pass") {
            Ok(Move::Pass)
        } else {
            s.parse().map(Move::Play)
        }
    }
}

/// Failure to decode a color, vertex or move from text.
#[derive(Debug, Clone, Display, Error)]
#[display("Parse error: {} at {}:{}", message, file, line)]
pub struct ParseMoveError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ParseMoveError {
    /// Creates a new parse error with caller location tracking.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
