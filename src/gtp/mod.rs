//! Go Text Protocol plumbing: process transport, response decoding and the
//! request/response client.

mod client;
mod response;
mod transport;

pub use client::{Channel, GtpClient};
pub use response::{FinalScore, ProtocolError, ProtocolErrorKind, parse_move, parse_score};
pub use transport::{EngineCommand, Stream, Transport, TransportError, TransportErrorKind};
