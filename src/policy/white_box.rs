//! Policies that query the victim engine through the shared GTP channel.

use super::Policy;
use crate::error::AttackError;
use crate::go::{Color, GoGame, Move};
use crate::gtp::Channel;
use tracing::{debug, instrument, warn};

/// Plays whatever the victim engine would play in the attacker's shoes.
#[derive(Debug)]
pub struct MyopicWhiteBoxPolicy {
    color: Color,
    channel: Channel,
}

impl MyopicWhiteBoxPolicy {
    /// Creates a policy borrowing the engine channel for the game.
    pub fn new(color: Color, channel: Channel) -> Self {
        Self { color, channel }
    }
}

#[async_trait::async_trait]
impl Policy for MyopicWhiteBoxPolicy {
    #[instrument(skip_all, fields(color = %self.color))]
    async fn next_move(&mut self, game: &GoGame) -> Result<Move, AttackError> {
        engine_suggestion(&self.channel, game, self.color).await
    }

    fn name(&self) -> &str {
        "myopic"
    }
}

/// Occupies the point the victim engine wants to play next.
///
/// Falls back to the engine's suggestion for the attacker when the victim's
/// preferred point is a pass or not playable.
#[derive(Debug)]
pub struct NonMyopicWhiteBoxPolicy {
    color: Color,
    channel: Channel,
}

impl NonMyopicWhiteBoxPolicy {
    /// Creates a policy borrowing the engine channel for the game.
    pub fn new(color: Color, channel: Channel) -> Self {
        Self { color, channel }
    }
}

#[async_trait::async_trait]
impl Policy for NonMyopicWhiteBoxPolicy {
    #[instrument(skip_all, fields(color = %self.color))]
    async fn next_move(&mut self, game: &GoGame) -> Result<Move, AttackError> {
        let victim = self.color.opponent();
        let wanted = self.channel.lock().await.reg_gen_move(victim).await?;

        if let Move::Play(point) = wanted
            && game.is_legal(point)
        {
            debug!(%point, "Taking the victim's preferred point");
            return Ok(wanted);
        }

        engine_suggestion(&self.channel, game, self.color).await
    }

    fn name(&self) -> &str {
        "non-myopic"
    }
}

/// The engine's `reg_genmove` answer for `color`, or a pass if the local
/// board model disagrees about its legality.
async fn engine_suggestion(
    channel: &Channel,
    game: &GoGame,
    color: Color,
) -> Result<Move, AttackError> {
    let suggestion = channel.lock().await.reg_gen_move(color).await?;
    match suggestion {
        Move::Play(point) if !game.is_legal(point) => {
            warn!(%point, "Engine suggested a move the board model rejects, passing");
            Ok(Move::Pass)
        }
        mv => Ok(mv),
    }
}
