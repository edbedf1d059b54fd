//! Cross-checks the engine's reported result against the local board model.

use crate::go::{Color, GoGame};
use crate::gtp::FinalScore;
use derive_more::Display;
use derive_new::new;
use tracing::{instrument, warn};

/// Largest absolute difference still treated as agreement.
const TOLERANCE: f64 = 1e-6;

/// The engine's margin disagrees with the locally computed one.
///
/// This is a diagnostic, not an error: the game is still recorded.
#[derive(Debug, Clone, Copy, PartialEq, Display, new)]
#[display("engine margin {engine_margin} does not match local margin {local_margin}")]
pub struct ScoreMismatch {
    /// Margin reported by the engine (always non-negative).
    pub engine_margin: f64,
    /// `white - black` from the local board model.
    pub local_margin: f64,
}

/// Result of comparing the two scores.
#[derive(Debug, Clone, Copy, PartialEq, new)]
pub struct Reconciliation {
    /// Engine margin from the victim's point of view (positive = victim ahead).
    pub margin: f64,
    /// Present when the two scores disagree.
    pub mismatch: Option<ScoreMismatch>,
}

/// Compares `engine` to `game.score()` and signs the margin for `victim`.
#[instrument(skip(game), fields(moves = game.history().len()))]
pub fn reconcile(game: &GoGame, engine: &FinalScore, victim: Color) -> Reconciliation {
    let (black, white) = game.score();
    let local_margin = white - black;

    let mismatch = ((local_margin.abs() - engine.margin.abs()).abs() > TOLERANCE).then(|| {
        let mismatch = ScoreMismatch::new(engine.margin, local_margin);
        warn!(%mismatch, "Score mismatch");
        mismatch
    });

    let margin = match engine.winner {
        Some(winner) if winner == victim => engine.margin,
        Some(_) => -engine.margin,
        None => 0.0,
    };

    Reconciliation::new(margin, mismatch)
}
