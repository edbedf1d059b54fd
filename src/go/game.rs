//! Go board model: move legality, captures, termination and area scoring.

use super::types::{Color, MAX_BOARD_SIZE, Move, Point};
use derive_more::{Display, Error};
use std::fmt;
use tracing::{debug, instrument};

/// Komi used when none is configured.
pub const DEFAULT_KOMI: f64 = 7.5;

/// A single game of Go.
///
/// The side to move alternates after every move, passes included. The game is
/// over after two consecutive passes.
#[derive(Debug, Clone, PartialEq)]
pub struct GoGame {
    size: usize,
    komi: f64,
    board: Vec<Option<Color>>,
    to_move: Color,
    history: Vec<(Color, Move)>,
    ko: Option<Point>,
    consecutive_passes: u8,
}

impl GoGame {
    /// Creates an empty board of `size` x `size` with the given komi.
    #[instrument]
    pub fn new(size: usize, komi: f64) -> Result<Self, GoError> {
        if !(2..=MAX_BOARD_SIZE).contains(&size) {
            return Err(GoError::new(format!(
                "board size {} outside 2..={}",
                size, MAX_BOARD_SIZE
            )));
        }
        Ok(Self {
            size,
            komi,
            board: vec![None; size * size],
            to_move: Color::Black,
            history: Vec::new(),
            ko: None,
            consecutive_passes: 0,
        })
    }

    /// Board edge length.
    pub fn board_size(&self) -> usize {
        self.size
    }

    /// Komi credited to White.
    pub fn komi(&self) -> f64 {
        self.komi
    }

    /// Color whose turn it is.
    pub fn current_player(&self) -> Color {
        self.to_move
    }

    /// Every move played so far, in order.
    pub fn history(&self) -> &[(Color, Move)] {
        &self.history
    }

    /// The most recent move made by `color`.
    pub fn last_move_by(&self, color: Color) -> Option<Move> {
        self.history
            .iter()
            .rev()
            .find(|(c, _)| *c == color)
            .map(|(_, m)| *m)
    }

    /// Stone on `point`, if any.
    pub fn stone_at(&self, point: Point) -> Option<Color> {
        if point.is_on_board(self.size) {
            self.board[self.index(point)]
        } else {
            None
        }
    }

    /// Whether two consecutive passes have ended the game.
    pub fn is_over(&self) -> bool {
        self.consecutive_passes >= 2
    }

    /// Plays `mv` for the side to move.
    #[instrument(skip(self), fields(color = %self.to_move))]
    pub fn play_move(&mut self, mv: Move) -> Result<(), GoError> {
        if self.is_over() {
            return Err(GoError::new(format!("move {} after game end", mv)));
        }

        let color = self.to_move;
        match mv {
            Move::Pass => {
                self.consecutive_passes += 1;
                self.ko = None;
            }
            Move::Play(point) => {
                self.place_stone(color, point)?;
                self.consecutive_passes = 0;
            }
        }

        self.history.push((color, mv));
        self.to_move = color.opponent();
        Ok(())
    }

    /// Whether the side to move may play on `point`.
    pub fn is_legal(&self, point: Point) -> bool {
        if !point.is_on_board(self.size) || self.stone_at(point).is_some() || self.is_over() {
            return false;
        }
        if self.ko == Some(point) {
            return false;
        }

        let color = self.to_move;
        self.neighbors(point).any(|n| match self.board[self.index(n)] {
            None => true,
            Some(c) if c == color => self.liberties(n) > 1,
            Some(_) => self.liberties(n) == 1,
        })
    }

    /// All points the side to move may legally play, in row-major order.
    pub fn legal_points(&self) -> Vec<Point> {
        self.points().filter(|&p| self.is_legal(p)).collect()
    }

    /// Whether `point` is empty and surrounded only by `color` stones.
    pub fn is_own_eye(&self, point: Point, color: Color) -> bool {
        self.stone_at(point).is_none()
            && self
                .neighbors(point)
                .all(|n| self.board[self.index(n)] == Some(color))
    }

    /// Area score `(black, white)`; komi is added to White.
    #[instrument(skip(self))]
    pub fn score(&self) -> (f64, f64) {
        let mut black = 0usize;
        let mut white = 0usize;
        let mut seen = vec![false; self.board.len()];

        for point in self.points() {
            let idx = self.index(point);
            match self.board[idx] {
                Some(Color::Black) => black += 1,
                Some(Color::White) => white += 1,
                None if !seen[idx] => {
                    let (region, borders) = self.empty_region(point, &mut seen);
                    match borders {
                        (true, false) => black += region,
                        (false, true) => white += region,
                        _ => {}
                    }
                }
                None => {}
            }
        }

        let score = (black as f64, white as f64 + self.komi);
        debug!(black = score.0, white = score.1, "Scored board");
        score
    }

    /// Renders the game as an SGF record with `title` as the root comment.
    pub fn to_sgf(&self, title: &str) -> String {
        let mut sgf = format!(
            "(;FF[4]GM[1]CA[UTF-8]SZ[{}]KM[{}]C[{}]",
            self.size,
            self.komi,
            escape_sgf(title)
        );

        if self.is_over() {
            let (black, white) = self.score();
            let margin = white - black;
            if margin > 0.0 {
                sgf.push_str(&format!("RE[W+{}]", margin));
            } else if margin < 0.0 {
                sgf.push_str(&format!("RE[B+{}]", -margin));
            } else {
                sgf.push_str("RE[0]");
            }
        }

        for (color, mv) in &self.history {
            sgf.push(';');
            sgf.push(color.letter());
            sgf.push('[');
            if let Move::Play(p) = mv {
                sgf.push((b'a' + p.col) as char);
                sgf.push((b'a' + (self.size as u8 - 1 - p.row)) as char);
            }
            sgf.push(']');
        }
        sgf.push_str(")\n");
        sgf
    }

    fn place_stone(&mut self, color: Color, point: Point) -> Result<(), GoError> {
        if !point.is_on_board(self.size) {
            return Err(GoError::new(format!("{} is off the {}x{} board", point, self.size, self.size)));
        }
        if self.stone_at(point).is_some() {
            return Err(GoError::new(format!("{} is occupied", point)));
        }
        if self.ko == Some(point) {
            return Err(GoError::new(format!("{} retakes a ko", point)));
        }

        let idx = self.index(point);
        self.board[idx] = Some(color);

        let mut captured = Vec::new();
        let enemies: Vec<Point> = self
            .neighbors(point)
            .filter(|&n| self.board[self.index(n)] == Some(color.opponent()))
            .collect();
        for enemy in enemies {
            if self.board[self.index(enemy)].is_some() && self.liberties(enemy) == 0 {
                captured.extend(self.remove_group(enemy));
            }
        }

        let (group, liberties) = self.group(point);
        if liberties == 0 {
            self.board[idx] = None;
            return Err(GoError::new(format!("{} is suicide", point)));
        }

        self.ko = match captured.as_slice() {
            [single] if group.len() == 1 && liberties == 1 => Some(*single),
            _ => None,
        };
        if !captured.is_empty() {
            debug!(%point, count = captured.len(), "Captured stones");
        }
        Ok(())
    }

    fn remove_group(&mut self, start: Point) -> Vec<Point> {
        let (group, _) = self.group(start);
        for p in &group {
            let idx = self.index(*p);
            self.board[idx] = None;
        }
        group
    }

    fn liberties(&self, point: Point) -> usize {
        self.group(point).1
    }

    /// Stones connected to `start` and their liberty count.
    fn group(&self, start: Point) -> (Vec<Point>, usize) {
        let color = self.board[self.index(start)];
        let mut visited = vec![false; self.board.len()];
        let mut counted = vec![false; self.board.len()];
        let mut stack = vec![start];
        let mut stones = Vec::new();
        let mut liberties = 0;
        visited[self.index(start)] = true;

        while let Some(p) = stack.pop() {
            stones.push(p);
            for n in self.neighbors(p) {
                let idx = self.index(n);
                match self.board[idx] {
                    None if !counted[idx] => {
                        counted[idx] = true;
                        liberties += 1;
                    }
                    c if c == color && !visited[idx] => {
                        visited[idx] = true;
                        stack.push(n);
                    }
                    _ => {}
                }
            }
        }
        (stones, liberties)
    }

    /// Size of the empty region containing `start` and whether it touches
    /// black and white stones.
    fn empty_region(&self, start: Point, seen: &mut [bool]) -> (usize, (bool, bool)) {
        let mut stack = vec![start];
        let mut size = 0;
        let mut touches = (false, false);
        seen[self.index(start)] = true;

        while let Some(p) = stack.pop() {
            size += 1;
            for n in self.neighbors(p) {
                let idx = self.index(n);
                match self.board[idx] {
                    Some(Color::Black) => touches.0 = true,
                    Some(Color::White) => touches.1 = true,
                    None if !seen[idx] => {
                        seen[idx] = true;
                        stack.push(n);
                    }
                    None => {}
                }
            }
        }
        (size, touches)
    }

    fn index(&self, point: Point) -> usize {
        point.row as usize * self.size + point.col as usize
    }

    fn points(&self) -> impl Iterator<Item = Point> + '_ {
        (0..self.size).flat_map(|row| (0..self.size).map(move |col| Point::new(col as u8, row as u8)))
    }

    fn neighbors(&self, point: Point) -> impl Iterator<Item = Point> + '_ {
        const DELTAS: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
        let size = self.size as i32;
        DELTAS.iter().filter_map(move |(dc, dr)| {
            let col = point.col as i32 + dc;
            let row = point.row as i32 + dr;
            if (0..size).contains(&col) && (0..size).contains(&row) {
                Some(Point::new(col as u8, row as u8))
            } else {
                None
            }
        })
    }
}

impl fmt::Display for GoGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters: String = super::types::COLUMN_LETTERS[..self.size]
            .iter()
            .map(|&c| format!(" {}", c as char))
            .collect();
        writeln!(f, "   {}", letters)?;
        for row in (0..self.size).rev() {
            write!(f, "{:>2} ", row + 1)?;
            for col in 0..self.size {
                let symbol = match self.board[row * self.size + col] {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, " {}", symbol)?;
            }
            writeln!(f)?;
        }
        write!(f, "{} to move, {} moves played", self.to_move.title(), self.history.len())
    }
}

fn escape_sgf(text: &str) -> String {
    text.replace('\\', "\\\\").replace(']', "\\]")
}

/// Illegal move or invalid board setup.
#[derive(Debug, Clone, Display, Error)]
#[display("Go error: {} at {}:{}", message, file, line)]
pub struct GoError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl GoError {
    /// Creates a new board-model error with caller location tracking.
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
