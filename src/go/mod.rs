//! Go board model consumed by the session orchestrator and the policies.

mod game;
mod types;

pub use game::{DEFAULT_KOMI, GoError, GoGame};
pub use types::{COLUMN_LETTERS, Color, MAX_BOARD_SIZE, Move, ParseMoveError, Point};
