//! Attacker move-selection policies.
//!
//! Every policy is built through [`PolicyKind::build`]; kinds that need to
//! query the victim engine say so through [`PolicyKind::requires_channel`]
//! and receive the shared [`Channel`].

mod heuristic;
mod passing;
mod white_box;

pub use heuristic::{EdgePolicy, MirrorPolicy, PassPolicy, RandomPolicy, SpiralPolicy, spiral_order};
pub use passing::PassingWrapper;
pub use white_box::{MyopicWhiteBoxPolicy, NonMyopicWhiteBoxPolicy};

use crate::config::ConfigError;
use crate::error::AttackError;
use crate::go::{Color, GoGame, Move, Point};
use crate::gtp::Channel;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Trait for anything that picks the attacker's next move.
#[async_trait::async_trait]
pub trait Policy: Send {
    /// Chooses the next move for this policy's color; `Move::Pass` to pass.
    async fn next_move(&mut self, game: &GoGame) -> Result<Move, AttackError>;

    /// Returns the policy's display name.
    fn name(&self) -> &str;
}

/// Available attacker strategies.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Uniformly random legal move.
    Random,
    /// Random legal move on the first line.
    Edge,
    /// Always pass.
    Pass,
    /// Fill the board from the outside in.
    Spiral,
    /// Point-reflect the victim's last move.
    Mirror,
    /// Play the victim engine's own suggestion for the attacker.
    Myopic,
    /// Take the point the victim engine wants next.
    NonMyopic,
}

impl PolicyKind {
    /// Whether the policy queries the victim engine while choosing moves.
    pub fn requires_channel(self) -> bool {
        matches!(self, PolicyKind::Myopic | PolicyKind::NonMyopic)
    }

    /// Whether the policy needs the victim to have moved before it can play.
    pub fn requires_victim_first(self) -> bool {
        matches!(self, PolicyKind::Mirror)
    }

    /// Capitalized name used in game record titles.
    pub fn title(self) -> String {
        let name = self.to_string();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => name,
        }
    }

    /// Builds a fresh policy for one game.
    ///
    /// `channel` is only used by kinds that [require it](Self::requires_channel).
    #[instrument(skip(rng, channel), fields(has_channel = channel.is_some()))]
    pub fn build(
        self,
        color: Color,
        rng: ChaCha8Rng,
        channel: Option<Channel>,
    ) -> Result<Box<dyn Policy>, ConfigError> {
        debug!("Building attacker policy");
        let policy: Box<dyn Policy> = match self {
            PolicyKind::Random => Box::new(RandomPolicy::new(color, rng)),
            PolicyKind::Edge => Box::new(EdgePolicy::new(color, rng)),
            PolicyKind::Pass => Box::new(PassPolicy::new()),
            PolicyKind::Spiral => Box::new(SpiralPolicy::new(color)),
            PolicyKind::Mirror => Box::new(MirrorPolicy::new(color, rng)),
            PolicyKind::Myopic | PolicyKind::NonMyopic => {
                let channel = channel.ok_or_else(|| {
                    ConfigError::new(format!("{} policy needs access to the engine channel", self))
                })?;
                if self == PolicyKind::Myopic {
                    Box::new(MyopicWhiteBoxPolicy::new(color, channel))
                } else {
                    Box::new(NonMyopicWhiteBoxPolicy::new(color, channel))
                }
            }
        };
        Ok(policy)
    }
}

/// Legal points for `color` that do not fill one of its own eyes.
pub(crate) fn candidate_points(game: &GoGame, color: Color) -> Vec<Point> {
    game.legal_points()
        .into_iter()
        .filter(|&p| !game.is_own_eye(p, color))
        .collect()
}
