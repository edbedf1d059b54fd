//! Run configuration: TOML file, defaults and validation.

use crate::go::{Color, DEFAULT_KOMI, MAX_BOARD_SIZE};
use crate::gtp::EngineCommand;
use crate::policy::PolicyKind;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Everything needed to run a batch of games against one engine.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Engine launch settings and protocol timeouts.
    engine: EngineConfig,

    /// Number of games to play.
    num_games: usize,

    /// Seed for the run RNG; fixes every policy decision of the run.
    seed: u64,

    /// Board edge length.
    board_size: usize,

    /// Komi sent to the engine and used for local scoring.
    komi: f64,

    /// Attacker strategy.
    strategy: PolicyKind,

    /// Attacker calls after which it always passes.
    turns_before_pass: u32,

    /// Color played by the engine under attack.
    victim: Color,

    /// Directory for SGF records; nothing is written when unset.
    log_dir: Option<PathBuf>,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            num_games: 100,
            seed: 42,
            board_size: 19,
            komi: DEFAULT_KOMI,
            strategy: PolicyKind::Edge,
            turns_before_pass: 211,
            victim: Color::Black,
            log_dir: None,
        }
    }
}

impl AttackConfig {
    /// Loads configuration from a TOML file; missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(strategy = %config.strategy, victim = %config.victim, "Config loaded successfully");
        Ok(config)
    }

    /// Color played by the attacker.
    pub fn attacker(&self) -> Color {
        self.victim.opponent()
    }

    /// Rejects option combinations that cannot produce a meaningful run.
    ///
    /// Called before any engine process is launched.
    #[instrument(skip(self))]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strategy.requires_victim_first() && self.victim != Color::Black {
            return Err(ConfigError::new(format!(
                "{} strategy needs the victim to move first, so the victim must be black",
                self.strategy
            )));
        }
        if !(2..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(ConfigError::new(format!(
                "board size {} outside 2..={}",
                self.board_size, MAX_BOARD_SIZE
            )));
        }
        if self.num_games == 0 {
            return Err(ConfigError::new("number of games must be positive".to_string()));
        }
        if !self.komi.is_finite() {
            return Err(ConfigError::new(format!("komi {} is not a number", self.komi)));
        }
        if self.engine.command.argv().is_empty() {
            return Err(ConfigError::new("engine command is empty".to_string()));
        }
        if self.engine.ready_timeout_ms == 0 || self.engine.response_timeout_ms == 0 {
            return Err(ConfigError::new("engine timeouts must be positive".to_string()));
        }
        debug!("Config validated");
        Ok(())
    }

    /// Sets the engine settings.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Sets the number of games.
    pub fn with_num_games(mut self, num_games: usize) -> Self {
        self.num_games = num_games;
        self
    }

    /// Sets the run seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the board size.
    pub fn with_board_size(mut self, board_size: usize) -> Self {
        self.board_size = board_size;
        self
    }

    /// Sets the komi.
    pub fn with_komi(mut self, komi: f64) -> Self {
        self.komi = komi;
        self
    }

    /// Sets the attacker strategy.
    pub fn with_strategy(mut self, strategy: PolicyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the pass-forcing threshold.
    pub fn with_turns_before_pass(mut self, turns: u32) -> Self {
        self.turns_before_pass = turns;
        self
    }

    /// Sets the victim color.
    pub fn with_victim(mut self, victim: Color) -> Self {
        self.victim = victim;
        self
    }

    /// Sets the SGF output directory.
    pub fn with_log_dir(mut self, log_dir: Option<PathBuf>) -> Self {
        self.log_dir = log_dir;
        self
    }
}

/// How to reach the engine and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Launch command.
    command: EngineCommand,

    /// Prefix of the stderr line announcing readiness.
    ready_prefix: String,

    /// Milliseconds to wait for the readiness line.
    ready_timeout_ms: u64,

    /// Milliseconds to wait for any single response.
    response_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: EngineCommand::default(),
            ready_prefix: "GTP ready".to_string(),
            ready_timeout_ms: 120_000,
            response_timeout_ms: 300_000,
        }
    }
}

impl EngineConfig {
    /// Creates engine settings with default timeouts.
    pub fn new(command: EngineCommand) -> Self {
        Self {
            command,
            ..Self::default()
        }
    }

    /// Builds the KataGo GTP command line.
    #[instrument]
    pub fn katago(
        executable: &Path,
        model: &Path,
        engine_config: &Path,
        max_playouts: u32,
    ) -> EngineCommand {
        EngineCommand::new(vec![
            executable.display().to_string(),
            "gtp".to_string(),
            "-model".to_string(),
            model.display().to_string(),
            "-override-config".to_string(),
            format!("maxPlayouts={}", max_playouts),
            "-config".to_string(),
            engine_config.display().to_string(),
        ])
    }

    /// Replaces the launch command.
    pub fn with_command(mut self, command: EngineCommand) -> Self {
        self.command = command;
        self
    }

    /// Sets both timeouts at millisecond precision; zero becomes one millisecond.
    pub fn with_timeouts(mut self, ready: Duration, response: Duration) -> Self {
        self.ready_timeout_ms = whole_millis(ready);
        self.response_timeout_ms = whole_millis(response);
        self
    }

    /// Readiness wait as a [`Duration`].
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }

    /// Per-response wait as a [`Duration`].
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

fn whole_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX).max(1)
}

/// Picks the smallest `*.bin.gz` network in `dir`.
#[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
pub fn discover_model(dir: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| {
        ConfigError::new(format!("Failed to read model directory {}: {}", dir.display(), e))
    })?;

    let mut best: Option<(u64, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_model = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(".bin.gz"));
        if !is_model {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        if best.as_ref().is_none_or(|(size, _)| meta.len() < *size) {
            best = Some((meta.len(), path));
        }
    }

    let (_, model) = best.ok_or_else(|| {
        ConfigError::new(format!(
            "Could not find a model in {}; please set --model",
            dir.display()
        ))
    })?;
    info!(model = %model.display(), "Discovered model");
    Ok(model)
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
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
