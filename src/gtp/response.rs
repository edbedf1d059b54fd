//! Decoding of GTP response bodies.

use crate::go::{Color, Move};
use derive_more::{Display, Error};
use derive_new::new;
use tracing::instrument;

/// Outcome reported by the engine's `final_score`.
#[derive(Debug, Clone, Copy, PartialEq, new)]
pub struct FinalScore {
    /// Winning color; `None` for a draw.
    pub winner: Option<Color>,
    /// Non-negative winning margin.
    pub margin: f64,
}

impl std::fmt::Display for FinalScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.winner {
            Some(color) => write!(f, "{}+{}", color, self.margin),
            None => f.write_str("0"),
        }
    }
}

/// Decodes a `genmove`/`reg_genmove` body: `pass` or a vertex such as `Q16`.
#[instrument]
pub fn parse_move(body: &str) -> Result<Move, ProtocolError> {
    let body = body.trim();
    if body.eq_ignore_ascii_case("pass") {
        return Ok(Move::Pass);
    }

    let bytes = body.as_bytes();
    let shaped = (2..=3).contains(&bytes.len())
        && bytes[0].is_ascii_alphabetic()
        && !bytes[0].eq_ignore_ascii_case(&b'I')
        && bytes[1..].iter().all(u8::is_ascii_digit);
    if !shaped {
        return Err(ProtocolError::new(
            ProtocolErrorKind::Malformed,
            format!("expected a vertex or pass, got {:?}", body),
        ));
    }

    body.parse().map_err(|e: crate::go::ParseMoveError| {
        ProtocolError::new(ProtocolErrorKind::Malformed, e.message)
    })
}

/// Decodes a `final_score` body: `B+3.5`, `W+12`, or `0` for a draw.
#[instrument]
pub fn parse_score(body: &str) -> Result<FinalScore, ProtocolError> {
    let body = body.trim();
    if body == "0" {
        return Ok(FinalScore::new(None, 0.0));
    }

    let malformed = || {
        ProtocolError::new(
            ProtocolErrorKind::Malformed,
            format!("expected <color>+<margin>, got {:?}", body),
        )
    };

    let (tag, margin) = body.split_once('+').ok_or_else(malformed)?;
    let winner = match tag {
        "B" | "b" => Color::Black,
        "W" | "w" => Color::White,
        _ => return Err(malformed()),
    };

    let digits_ok = !margin.is_empty()
        && margin.bytes().all(|b| b.is_ascii_digit() || b == b'.')
        && margin.bytes().next().is_some_and(|b| b.is_ascii_digit())
        && margin.bytes().filter(|&b| b == b'.').count() <= 1;
    if !digits_ok {
        return Err(malformed());
    }
    let margin: f64 = margin.parse().map_err(|_| malformed())?;

    Ok(FinalScore::new(Some(winner), margin))
}

/// Category of a [`ProtocolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProtocolErrorKind {
    /// Response did not have the expected shape.
    #[display("malformed")]
    Malformed,
    /// Engine answered with a `?` failure response.
    #[display("rejected")]
    Rejected,
    /// Engine output ended mid-exchange.
    #[display("closed")]
    Closed,
    /// No response within the deadline.
    #[display("timeout")]
    Timeout,
}

/// Protocol failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Protocol error ({}): {} at {}:{}", kind, message, file, line)]
pub struct ProtocolError {
    /// Failure category.
    pub kind: ProtocolErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ProtocolError {
    /// Creates a new protocol error with caller location tracking.
    #[track_caller]
    pub fn new(kind: ProtocolErrorKind, message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<super::transport::TransportError> for ProtocolError {
    #[track_caller]
    fn from(err: super::transport::TransportError) -> Self {
        use super::transport::TransportErrorKind;
        let kind = match err.kind {
            TransportErrorKind::Timeout => ProtocolErrorKind::Timeout,
            _ => ProtocolErrorKind::Closed,
        };
        Self::new(kind, err.message)
    }
}
