//! Per-game orchestration between the victim engine and the attacker policy.
//!
//! A game moves through [`Phase::Setup`], an optional [`Phase::OpeningMove`]
//! (attacker is Black), [`Phase::Alternating`] until the board model reports
//! the game over, then [`Phase::Scoring`] and [`Phase::Done`]. Every move of
//! either side is applied to the local [`GoGame`] and sent to (or generated
//! by) the engine, so both copies of the game stay in step.

use crate::config::AttackConfig;
use crate::error::AttackError;
use crate::go::{Color, GoGame, Move};
use crate::gtp::{Channel, FinalScore};
use crate::policy::{PassingWrapper, Policy, PolicyKind};
use crate::reconcile::{ScoreMismatch, reconcile};
use crate::run::RunContext;
use derive_more::Display;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Where the orchestrator is within the current game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Phase {
    /// Fresh board and policy, engine prepared.
    Setup,
    /// Attacker plays first as Black.
    OpeningMove,
    /// Victim and attacker take turns.
    Alternating,
    /// Asking the engine for its verdict.
    Scoring,
    /// Outcome available.
    Done,
}

/// Everything known about one finished game.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    /// Zero-based game index within the run.
    pub index: usize,
    /// Final local game state.
    pub game: GoGame,
    /// Result as reported by the engine.
    pub engine_score: FinalScore,
    /// Engine margin signed for the victim (positive = victim ahead).
    pub margin: f64,
    /// Set when local and engine scores disagree.
    pub mismatch: Option<ScoreMismatch>,
    /// Number of `genmove` requests made.
    pub victim_turns: u32,
    /// Number of attacker policy calls.
    pub attacker_turns: u32,
}

/// Drives games against the engine on a shared [`Channel`].
#[derive(Debug)]
pub struct Orchestrator {
    channel: Channel,
    victim: Color,
    strategy: PolicyKind,
    board_size: usize,
    komi: f64,
    turns_before_pass: u32,
    phase: Phase,
    board_configured: bool,
    engine_dirty: bool,
}

impl Orchestrator {
    /// Creates an orchestrator for the games described by `config`.
    pub fn new(channel: Channel, config: &AttackConfig) -> Self {
        Self {
            channel,
            victim: *config.victim(),
            strategy: *config.strategy(),
            board_size: *config.board_size(),
            komi: *config.komi(),
            turns_before_pass: *config.turns_before_pass(),
            phase: Phase::Done,
            board_configured: false,
            engine_dirty: false,
        }
    }

    /// The shared engine channel.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Phase reached by the current or most recent game.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Plays one full game and returns its outcome.
    #[instrument(skip(self, ctx), fields(victim = %self.victim, strategy = %self.strategy))]
    pub async fn play_game(
        &mut self,
        index: usize,
        ctx: &mut RunContext,
    ) -> Result<GameOutcome, AttackError> {
        self.enter(Phase::Setup);
        let attacker = self.victim.opponent();
        let game = GoGame::new(self.board_size, self.komi)?;
        let channel = self
            .strategy
            .requires_channel()
            .then(|| Arc::clone(&self.channel));
        let policy = self.strategy.build(attacker, ctx.game_rng(), channel)?;
        let policy = PassingWrapper::new(policy, self.turns_before_pass);
        self.prepare_engine().await?;

        let mut session = Session {
            game,
            policy,
            channel: Arc::clone(&self.channel),
            victim: self.victim,
            victim_turns: 0,
        };

        if attacker == Color::Black {
            self.enter(Phase::OpeningMove);
            session.attacker_turn().await?;
        }

        self.enter(Phase::Alternating);
        while !session.game.is_over() {
            session.victim_turn().await?;
            if session.game.is_over() {
                break;
            }
            session.attacker_turn().await?;
        }

        self.enter(Phase::Scoring);
        let engine_score = self.channel.lock().await.final_score().await?;
        let reconciliation = reconcile(&session.game, &engine_score, self.victim);
        if reconciliation.mismatch.is_some() {
            self.dump_boards(&session.game).await;
        }

        self.channel.lock().await.clear_board().await?;
        self.engine_dirty = false;

        info!(
            game = index + 1,
            engine_result = %engine_score,
            margin = reconciliation.margin,
            moves = session.game.history().len(),
            "Game finished"
        );

        self.enter(Phase::Done);
        Ok(GameOutcome {
            index,
            engine_score,
            margin: reconciliation.margin,
            mismatch: reconciliation.mismatch,
            victim_turns: session.victim_turns,
            attacker_turns: session.policy.turns(),
            game: session.game,
        })
    }

    /// Sends the board setup once per run and clears leftovers from a game
    /// that ended without reaching the scoring phase.
    async fn prepare_engine(&mut self) -> Result<(), AttackError> {
        let mut client = self.channel.lock().await;
        if !self.board_configured {
            client.set_board_size(self.board_size).await?;
            client.set_komi(self.komi).await?;
            self.board_configured = true;
        }
        if self.engine_dirty {
            debug!("Clearing board left over from an unfinished game");
            client.clear_board().await?;
        }
        self.engine_dirty = true;
        Ok(())
    }

    async fn dump_boards(&self, game: &GoGame) {
        warn!("Local board:\n{}", game);
        match self.channel.lock().await.show_board().await {
            Ok(lines) => warn!("Engine board:\n{}", lines.join("\n")),
            Err(e) => warn!(error = %e, "Could not fetch engine board"),
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!(from = %self.phase, to = %phase, "Phase change");
        self.phase = phase;
    }
}

/// State of a single game in progress.
struct Session {
    game: GoGame,
    policy: PassingWrapper,
    channel: Channel,
    victim: Color,
    victim_turns: u32,
}

impl Session {
    async fn victim_turn(&mut self) -> Result<(), AttackError> {
        debug_assert_eq!(self.game.current_player(), self.victim);
        let mv = self.channel.lock().await.gen_move(self.victim).await?;
        self.game.play_move(mv)?;
        self.victim_turns += 1;
        debug!(turn = self.victim_turns, %mv, "Victim played");
        Ok(())
    }

    async fn attacker_turn(&mut self) -> Result<(), AttackError> {
        let attacker = self.victim.opponent();
        debug_assert_eq!(self.game.current_player(), attacker);
        let mv: Move = self.policy.next_move(&self.game).await?;
        self.game.play_move(mv)?;
        self.channel.lock().await.play_move(attacker, mv).await?;
        if mv.is_pass() {
            debug!("Attacker passing");
        } else {
            debug!(%mv, "Attacker played");
        }
        Ok(())
    }
}
