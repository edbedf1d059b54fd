//! Command-line interface for the baseline attack runner.

use clap::Parser;
use go_attack::{Color, PolicyKind};
use std::path::PathBuf;

/// KataGo binary used when `--executable` is not given.
pub const DEFAULT_EXECUTABLE: &str = "engines/KataGo-custom/cpp/katago";

/// KataGo GTP config used when `--engine-config` is not given.
pub const DEFAULT_ENGINE_CONFIG: &str = "go_attack/configs/katago/baseline_attack.cfg";

/// Run a hardcoded adversarial attack against a GTP Go engine
#[derive(Parser, Debug)]
#[command(name = "baseline_attack")]
#[command(about = "Run a hardcoded adversarial attack against KataGo", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML run configuration; flags below override its values
    #[arg(long, env = "GO_ATTACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the KataGo executable [default: engines/KataGo-custom/cpp/katago]
    #[arg(long, env = "GO_ATTACK_EXECUTABLE")]
    pub executable: Option<PathBuf>,

    /// Neural network model file
    #[arg(long, env = "GO_ATTACK_MODEL")]
    pub model: Option<PathBuf>,

    /// Directory searched for the smallest *.bin.gz model when --model is absent
    #[arg(long, default_value = "go_attack/models")]
    pub models_dir: PathBuf,

    /// KataGo GTP config file [default: go_attack/configs/katago/baseline_attack.cfg]
    #[arg(long, env = "GO_ATTACK_ENGINE_CONFIG")]
    pub engine_config: Option<PathBuf>,

    /// Maximum number of MCTS playouts the engine is allowed to use
    #[arg(long, default_value = "512")]
    pub num_playouts: u32,

    /// Full engine command line (space-separated); bypasses the KataGo flags
    #[arg(long, env = "GO_ATTACK_ENGINE_COMMAND")]
    pub engine_command: Option<String>,

    /// Number of games
    #[arg(short = 'n', long)]
    pub num_games: Option<usize>,

    /// Random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Board size
    #[arg(long)]
    pub size: Option<usize>,

    /// Komi
    #[arg(long)]
    pub komi: Option<f64>,

    /// Adversarial policy to use
    #[arg(long)]
    pub strategy: Option<PolicyKind>,

    /// Number of turns before accepting a pass from the engine and ending the game
    #[arg(long)]
    pub turns_before_pass: Option<u32>,

    /// The player to attack (B or W)
    #[arg(long)]
    pub victim: Option<Color>,

    /// Where to save logged games
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Output every move
    #[arg(short, long)]
    pub verbose: bool,
}
