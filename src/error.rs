//! Crate-level error type.

use crate::config::ConfigError;
use crate::go::GoError;
use crate::gtp::{ProtocolError, ProtocolErrorKind, TransportError};
use crate::record::RecordError;
use derive_more::{Display, Error, From};

/// Any failure that can stop a game or a run.
#[derive(Debug, Clone, Display, Error, From)]
pub enum AttackError {
    /// Engine process could not be launched or never became ready.
    #[display("{_0}")]
    Transport(TransportError),
    /// A response could not be decoded or never arrived.
    #[display("{_0}")]
    Protocol(ProtocolError),
    /// Invalid option combination, raised before any process is launched.
    #[display("{_0}")]
    Config(ConfigError),
    /// A move was illegal in the local board model.
    #[display("{_0}")]
    Go(GoError),
    /// A finished game could not be persisted.
    #[display("{_0}")]
    Record(RecordError),
}

impl AttackError {
    /// Whether the engine is gone and no further game can be played.
    pub fn is_fatal_to_run(&self) -> bool {
        match self {
            AttackError::Transport(_) | AttackError::Config(_) => true,
            AttackError::Protocol(e) => e.kind == ProtocolErrorKind::Closed,
            AttackError::Go(_) | AttackError::Record(_) => false,
        }
    }
}
