//! Pass-forcing decorator that bounds game length.

use super::Policy;
use crate::error::AttackError;
use crate::go::{GoGame, Move};
use tracing::debug;

/// Wraps a policy and passes unconditionally from the `threshold`-th call on.
///
/// The counter advances on every call, and once it reaches the threshold the
/// wrapped policy is no longer consulted.
pub struct PassingWrapper {
    inner: Box<dyn Policy>,
    threshold: u32,
    turns: u32,
}

impl PassingWrapper {
    /// Wraps `inner`; a threshold of zero passes from the first call.
    pub fn new(inner: Box<dyn Policy>, threshold: u32) -> Self {
        Self {
            inner,
            threshold,
            turns: 0,
        }
    }

    /// Number of times [`Policy::next_move`] has been called.
    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// Whether the wrapper has started forcing passes.
    pub fn is_forcing(&self) -> bool {
        self.turns >= self.threshold
    }
}

impl std::fmt::Debug for PassingWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassingWrapper")
            .field("inner", &self.inner.name())
            .field("threshold", &self.threshold)
            .field("turns", &self.turns)
            .finish()
    }
}

#[async_trait::async_trait]
impl Policy for PassingWrapper {
    async fn next_move(&mut self, game: &GoGame) -> Result<Move, AttackError> {
        self.turns = self.turns.saturating_add(1);
        if self.is_forcing() {
            debug!(turns = self.turns, threshold = self.threshold, "Forcing pass");
            return Ok(Move::Pass);
        }
        self.inner.next_move(game).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
