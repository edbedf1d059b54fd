//! Batch driver: launches the engine, plays the configured number of games
//! and accumulates their margins.

use crate::config::AttackConfig;
use crate::error::AttackError;
use crate::gtp::{GtpClient, Transport};
use crate::record::{GameRecorder, SgfRecorder};
use crate::session::Orchestrator;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Ordered per-game margins plus diagnostic counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunAccumulator {
    margins: Vec<f64>,
    mismatches: usize,
    failed_games: usize,
}

impl RunAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the signed margin of a completed game.
    pub fn record(&mut self, margin: f64) {
        self.margins.push(margin);
    }

    /// Counts a game whose scores disagreed.
    pub fn record_mismatch(&mut self) {
        self.mismatches += 1;
    }

    /// Counts a game that was abandoned.
    pub fn record_failure(&mut self) {
        self.failed_games += 1;
    }

    /// Margins recorded so far, in game order.
    pub fn margins(&self) -> &[f64] {
        &self.margins
    }

    /// Computes the run statistics.
    pub fn summary(&self) -> RunSummary {
        let mean = (!self.margins.is_empty())
            .then(|| self.margins.iter().sum::<f64>() / self.margins.len() as f64);
        RunSummary {
            margins: self.margins.clone(),
            mean,
            victim_wins: self.margins.iter().filter(|&&m| m > 0.0).count(),
            victim_losses: self.margins.iter().filter(|&&m| m < 0.0).count(),
            mismatches: self.mismatches,
            failed_games: self.failed_games,
        }
    }
}

/// Final statistics of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Signed margins, one per completed game.
    pub margins: Vec<f64>,
    /// Arithmetic mean of `margins`; `None` when no game completed.
    pub mean: Option<f64>,
    /// Games the victim won.
    pub victim_wins: usize,
    /// Games the victim lost.
    pub victim_losses: usize,
    /// Games whose local and engine scores disagreed.
    pub mismatches: usize,
    /// Games abandoned after an error.
    pub failed_games: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mean {
            Some(mean) => write!(f, "Average score: {}", mean)?,
            None => write!(f, "Average score: n/a")?,
        }
        write!(
            f,
            " ({} games, victim won {}, lost {}, {} score mismatches, {} failed)",
            self.margins.len(),
            self.victim_wins,
            self.victim_losses,
            self.mismatches,
            self.failed_games
        )
    }
}

/// Run-level state threaded through every game.
#[derive(Debug, Clone)]
pub struct RunContext {
    rng: ChaCha8Rng,
    accumulator: RunAccumulator,
}

impl RunContext {
    /// Creates a context whose random decisions all derive from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            accumulator: RunAccumulator::new(),
        }
    }

    /// Independent RNG for the next game's policy.
    pub fn game_rng(&mut self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.rng.next_u64())
    }

    /// Results collected so far.
    pub fn accumulator(&self) -> &RunAccumulator {
        &self.accumulator
    }

    /// Mutable access to the collected results.
    pub fn accumulator_mut(&mut self) -> &mut RunAccumulator {
        &mut self.accumulator
    }
}

/// Plays a configured batch of games against one engine.
pub struct AttackRunner {
    config: AttackConfig,
    recorder: Option<Box<dyn GameRecorder>>,
}

impl fmt::Debug for AttackRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttackRunner")
            .field("config", &self.config)
            .field("recorder", &self.recorder.is_some())
            .finish()
    }
}

impl AttackRunner {
    /// Validates `config`; nothing is launched yet.
    #[instrument(skip(config))]
    pub fn new(config: AttackConfig) -> Result<Self, AttackError> {
        config.validate()?;
        Ok(Self {
            config,
            recorder: None,
        })
    }

    /// Persists every finished game through `recorder`.
    pub fn with_recorder(mut self, recorder: Box<dyn GameRecorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Title stored with each game record.
    pub fn game_title(&self) -> String {
        format!(
            "{} attack; {} victim",
            self.config.strategy().title(),
            self.config.victim().title()
        )
    }

    /// Launches the configured engine process and runs the batch.
    #[instrument(skip(self))]
    pub async fn launch(self) -> Result<RunSummary, AttackError> {
        let transport = Transport::start(self.config.engine().command())?;
        self.run(transport).await
    }

    /// Runs the batch over an already-connected transport.
    #[instrument(skip(self, transport), fields(games = *self.config.num_games()))]
    pub async fn run(mut self, mut transport: Transport) -> Result<RunSummary, AttackError> {
        let engine = self.config.engine().clone();
        let prefix = engine.ready_prefix().clone();
        transport
            .await_ready(|line| line.starts_with(prefix.as_str()), engine.ready_timeout())
            .await?;

        let channel = GtpClient::new(transport, engine.response_timeout()).into_channel();
        let mut orchestrator = Orchestrator::new(Arc::clone(&channel), &self.config);
        let mut ctx = RunContext::new(*self.config.seed());
        let title = self.game_title();
        let num_games = *self.config.num_games();

        for index in 0..num_games {
            info!(game = index + 1, of = num_games, "Starting game");
            match orchestrator.play_game(index, &mut ctx).await {
                Ok(outcome) => {
                    ctx.accumulator_mut().record(outcome.margin);
                    if outcome.mismatch.is_some() {
                        ctx.accumulator_mut().record_mismatch();
                    }
                    if let Some(recorder) = self.recorder.as_mut()
                        && let Err(e) = recorder.record(index, &outcome.game, &title)
                    {
                        warn!(error = %e, game = index, "Failed to save game record");
                    }
                }
                Err(e) if e.is_fatal_to_run() => {
                    ctx.accumulator_mut().record_failure();
                    error!(
                        error = %e,
                        game = index + 1,
                        phase = %orchestrator.phase(),
                        partial = %ctx.accumulator().summary(),
                        "Engine lost, aborting run"
                    );
                    return Err(e);
                }
                Err(e) => {
                    ctx.accumulator_mut().record_failure();
                    warn!(error = %e, game = index + 1, phase = %orchestrator.phase(), "Game abandoned");
                }
            }
        }

        if let Err(e) = channel.lock().await.quit().await {
            warn!(error = %e, "Engine did not acknowledge quit");
        }

        let summary = ctx.accumulator().summary();
        info!(%summary, "Run complete");
        Ok(summary)
    }
}

/// Validates `config`, sets up SGF logging if requested, launches the engine
/// and plays every game.
#[instrument(skip(config))]
pub async fn run_attack(config: AttackConfig) -> Result<RunSummary, AttackError> {
    let mut runner = AttackRunner::new(config.clone())?;
    if let Some(dir) = config.log_dir() {
        runner = runner.with_recorder(Box::new(SgfRecorder::new(dir)?));
    }
    runner.launch().await
}
