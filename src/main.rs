//! baseline_attack - plays a batch of games between an attacker policy and a
//! GTP engine and prints the victim's average margin.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, DEFAULT_ENGINE_CONFIG, DEFAULT_EXECUTABLE};
use go_attack::{AttackConfig, EngineCommand, EngineConfig, discover_model, run_attack};
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing(cli.verbose);

    let config = build_config(cli)?;
    info!(
        strategy = %config.strategy(),
        victim = %config.victim(),
        games = config.num_games(),
        "Running baseline attack"
    );

    let summary = run_attack(config).await?;
    println!("\n{}", summary);
    Ok(())
}

/// Merges the optional TOML file, the engine flags and the CLI overrides.
#[instrument(skip(cli))]
fn build_config(cli: Cli) -> Result<AttackConfig> {
    let mut config = match &cli.config {
        Some(path) => AttackConfig::from_file(path)?,
        None => AttackConfig::default(),
    };

    if let Some(command) = engine_command(&cli, config.engine().command())? {
        let engine = config.engine().clone().with_command(command);
        config = config.with_engine(engine);
    }

    if let Some(n) = cli.num_games {
        config = config.with_num_games(n);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if let Some(size) = cli.size {
        config = config.with_board_size(size);
    }
    if let Some(komi) = cli.komi {
        config = config.with_komi(komi);
    }
    if let Some(strategy) = cli.strategy {
        config = config.with_strategy(strategy);
    }
    if let Some(turns) = cli.turns_before_pass {
        config = config.with_turns_before_pass(turns);
    }
    if let Some(victim) = cli.victim {
        config = config.with_victim(victim);
    }
    if cli.log_dir.is_some() {
        config = config.with_log_dir(cli.log_dir.clone());
    }

    config.validate()?;
    Ok(config)
}

/// Engine command from the flags, or `None` to keep the configured one.
///
/// The KataGo command line is assembled when any KataGo flag is given or
/// when nothing else supplies a command; unset paths take their defaults.
fn engine_command(cli: &Cli, configured: &EngineCommand) -> Result<Option<EngineCommand>> {
    if let Some(raw) = &cli.engine_command {
        let argv: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
        return Ok(Some(EngineCommand::new(argv)));
    }

    let katago_flags =
        cli.executable.is_some() || cli.model.is_some() || cli.engine_config.is_some();
    if !katago_flags && !configured.argv().is_empty() {
        return Ok(None);
    }

    let executable = cli
        .executable
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_EXECUTABLE));
    let model = match &cli.model {
        Some(model) => model.clone(),
        None => discover_model(&cli.models_dir).context("Model discovery failed")?,
    };
    let engine_config = cli
        .engine_config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ENGINE_CONFIG));

    info!(
        executable = %executable.display(),
        model = %model.display(),
        config = %engine_config.display(),
        "Using KataGo"
    );
    Ok(Some(EngineConfig::katago(
        &executable,
        &model,
        &engine_config,
        cli.num_playouts,
    )))
}

fn initialize_tracing(verbose: bool) {
    let default = if verbose {
        "info,go_attack=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
