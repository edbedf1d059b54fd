//! Heuristic policies that only look at the local board.

use super::{Policy, candidate_points};
use crate::error::AttackError;
use crate::go::{Color, GoGame, Move, Point};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Plays a uniformly random legal move that does not fill its own eye.
#[derive(Debug)]
pub struct RandomPolicy {
    color: Color,
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    /// Creates a new random policy.
    pub fn new(color: Color, rng: ChaCha8Rng) -> Self {
        Self { color, rng }
    }
}

#[async_trait::async_trait]
impl Policy for RandomPolicy {
    async fn next_move(&mut self, game: &GoGame) -> Result<Move, AttackError> {
        let candidates = candidate_points(game, self.color);
        Ok(candidates
            .choose(&mut self.rng)
            .map_or(Move::Pass, |&p| Move::Play(p)))
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Plays random legal moves on the first line of the board.
#[derive(Debug)]
pub struct EdgePolicy {
    color: Color,
    rng: ChaCha8Rng,
}

impl EdgePolicy {
    /// Creates a new edge policy.
    pub fn new(color: Color, rng: ChaCha8Rng) -> Self {
        Self { color, rng }
    }
}

#[async_trait::async_trait]
impl Policy for EdgePolicy {
    async fn next_move(&mut self, game: &GoGame) -> Result<Move, AttackError> {
        let last = (game.board_size() - 1) as u8;
        let edge: Vec<Point> = candidate_points(game, self.color)
            .into_iter()
            .filter(|p| p.col == 0 || p.row == 0 || p.col == last || p.row == last)
            .collect();
        Ok(edge.choose(&mut self.rng).map_or(Move::Pass, |&p| Move::Play(p)))
    }

    fn name(&self) -> &str {
        "edge"
    }
}

/// Always passes.
#[derive(Debug, Default)]
pub struct PassPolicy;

impl PassPolicy {
    /// Creates a new pass policy.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Policy for PassPolicy {
    async fn next_move(&mut self, _game: &GoGame) -> Result<Move, AttackError> {
        Ok(Move::Pass)
    }

    fn name(&self) -> &str {
        "pass"
    }
}

/// Fills the board ring by ring from the outside in.
#[derive(Debug)]
pub struct SpiralPolicy {
    color: Color,
}

impl SpiralPolicy {
    /// Creates a new spiral policy.
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

#[async_trait::async_trait]
impl Policy for SpiralPolicy {
    async fn next_move(&mut self, game: &GoGame) -> Result<Move, AttackError> {
        let color = self.color;
        Ok(spiral_order(game.board_size())
            .into_iter()
            .find(|&p| game.is_legal(p) && !game.is_own_eye(p, color))
            .map_or(Move::Pass, Move::Play))
    }

    fn name(&self) -> &str {
        "spiral"
    }
}

/// Every point of a `size` board, outermost ring first, each ring clockwise
/// from its bottom-left corner.
pub fn spiral_order(size: usize) -> Vec<Point> {
    let mut order = Vec::with_capacity(size * size);
    let at = |col: usize, row: usize| Point::new(col as u8, row as u8);

    for ring in 0..size.div_ceil(2) {
        let lo = ring;
        let hi = size - 1 - ring;
        if lo == hi {
            order.push(at(lo, lo));
            continue;
        }
        order.extend((lo..hi).map(|row| at(lo, row)));
        order.extend((lo..hi).map(|col| at(col, hi)));
        order.extend((lo + 1..=hi).rev().map(|row| at(hi, row)));
        order.extend((lo + 1..=hi).rev().map(|col| at(col, lo)));
    }
    order
}

/// Answers each victim move with its reflection through the board centre.
///
/// Only meaningful when the victim moves first.
#[derive(Debug)]
pub struct MirrorPolicy {
    color: Color,
    fallback: RandomPolicy,
}

impl MirrorPolicy {
    /// Creates a new mirror policy; `rng` drives the random fallback.
    pub fn new(color: Color, rng: ChaCha8Rng) -> Self {
        Self {
            color,
            fallback: RandomPolicy::new(color, rng),
        }
    }
}

#[async_trait::async_trait]
impl Policy for MirrorPolicy {
    async fn next_move(&mut self, game: &GoGame) -> Result<Move, AttackError> {
        if let Some(Move::Play(victim)) = game.last_move_by(self.color.opponent()) {
            let target = victim.mirrored(game.board_size());
            if game.is_legal(target) && !game.is_own_eye(target, self.color) {
                return Ok(Move::Play(target));
            }
            debug!(%victim, %target, "Mirror point unavailable, falling back to random");
        }
        self.fallback.next_move(game).await
    }

    fn name(&self) -> &str {
        "mirror"
    }
}
