//! go_attack - adversarial policies against GTP Go engines
//!
//! Plays batches of Go games between an external engine (the victim) and a
//! pluggable attacker policy, keeping a local copy of every game in lock-step
//! with the engine and cross-checking the engine's final score.
//!
//! # Architecture
//!
//! - **go**: board model (moves, captures, ko, area scoring, SGF export)
//! - **gtp**: engine process transport and the request/response GTP client
//! - **policy**: attacker policies and the pass-forcing wrapper
//! - **session**: per-game orchestration state machine
//! - **reconcile**: engine vs. local score comparison
//! - **run**: batch driver and result accumulation
//!
//! # Example
//!
//! ```no_run
//! use go_attack::{AttackConfig, EngineCommand, EngineConfig, PolicyKind, run_attack};
//!
//! # async fn example() -> Result<(), go_attack::AttackError> {
//! let engine = EngineConfig::new(EngineCommand::new(vec![
//!     "katago".to_string(),
//!     "gtp".to_string(),
//! ]));
//! let config = AttackConfig::default()
//!     .with_engine(engine)
//!     .with_strategy(PolicyKind::Edge)
//!     .with_num_games(10);
//! let summary = run_attack(config).await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod reconcile;
mod record;
mod run;
mod session;

pub mod go;
pub mod gtp;
pub mod policy;

// Crate-level exports - Configuration
pub use config::{AttackConfig, ConfigError, EngineConfig, discover_model};

// Crate-level exports - Errors
pub use error::AttackError;

// Crate-level exports - Board model
pub use go::{Color, GoError, GoGame, Move, Point};

// Crate-level exports - Protocol
pub use gtp::{
    Channel, EngineCommand, FinalScore, GtpClient, ProtocolError, ProtocolErrorKind, Transport,
    TransportError, TransportErrorKind,
};

// Crate-level exports - Policies
pub use policy::{PassingWrapper, Policy, PolicyKind};

// Crate-level exports - Orchestration
pub use reconcile::{Reconciliation, ScoreMismatch, reconcile};
pub use record::{GameRecorder, RecordError, SgfRecorder};
pub use run::{AttackRunner, RunAccumulator, RunContext, RunSummary, run_attack};
pub use session::{GameOutcome, Orchestrator, Phase};
