//! Request/response GTP client on top of [`Transport`].

use super::response::{FinalScore, ProtocolError, ProtocolErrorKind, parse_move, parse_score};
use super::transport::{Stream, Transport};
use crate::go::{Color, Move};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// GTP channel shared between the orchestrator and white-box policies.
///
/// Whoever holds the lock owns exactly one command/response exchange.
pub type Channel = Arc<Mutex<GtpClient>>;

/// Synchronous, unpipelined GTP client.
///
/// Every operation writes one command and consumes its full response
/// (header, body, blank terminator) before returning. Commands carry a
/// numeric id; a reply echoing an older id is a late answer to an exchange
/// that timed out and is discarded.
#[derive(Debug)]
pub struct GtpClient {
    transport: Transport,
    response_timeout: Duration,
    next_id: u32,
}

impl GtpClient {
    /// Wraps a ready transport. Each response must arrive within `response_timeout`.
    pub fn new(transport: Transport, response_timeout: Duration) -> Self {
        Self {
            transport,
            response_timeout,
            next_id: 1,
        }
    }

    /// Moves this client behind a shared [`Channel`].
    pub fn into_channel(self) -> Channel {
        Arc::new(Mutex::new(self))
    }

    /// `boardsize <n>`.
    #[instrument(skip(self))]
    pub async fn set_board_size(&mut self, size: usize) -> Result<(), ProtocolError> {
        self.exchange(&format!("boardsize {}", size)).await.map(drop)
    }

    /// `komi <k>`.
    #[instrument(skip(self))]
    pub async fn set_komi(&mut self, komi: f64) -> Result<(), ProtocolError> {
        self.exchange(&format!("komi {}", komi)).await.map(drop)
    }

    /// `genmove <color>`: the engine chooses and plays a move.
    #[instrument(skip(self))]
    pub async fn gen_move(&mut self, color: Color) -> Result<Move, ProtocolError> {
        let body = self.exchange(&format!("genmove {}", color)).await?;
        let mv = parse_move(first_line(&body))?;
        debug!(%color, %mv, "Engine generated move");
        Ok(mv)
    }

    /// `reg_genmove <color>`: the engine's choice without playing it.
    #[instrument(skip(self))]
    pub async fn reg_gen_move(&mut self, color: Color) -> Result<Move, ProtocolError> {
        let body = self.exchange(&format!("reg_genmove {}", color)).await?;
        parse_move(first_line(&body))
    }

    /// `play <color> <vertex>`; the acknowledgement is discarded.
    #[instrument(skip(self))]
    pub async fn play_move(&mut self, color: Color, mv: Move) -> Result<(), ProtocolError> {
        self.exchange(&format!("play {} {}", color, mv)).await.map(drop)
    }

    /// `final_score`.
    #[instrument(skip(self))]
    pub async fn final_score(&mut self) -> Result<FinalScore, ProtocolError> {
        let body = self.exchange("final_score").await?;
        parse_score(first_line(&body))
    }

    /// `clear_board`.
    #[instrument(skip(self))]
    pub async fn clear_board(&mut self) -> Result<(), ProtocolError> {
        self.exchange("clear_board").await.map(drop)
    }

    /// `showboard`: the engine's board rendering, one entry per line.
    #[instrument(skip(self))]
    pub async fn show_board(&mut self) -> Result<Vec<String>, ProtocolError> {
        self.exchange("showboard").await
    }

    /// `quit`, then shuts the engine process down.
    #[instrument(skip(self))]
    pub async fn quit(&mut self) -> Result<(), ProtocolError> {
        let result = self.exchange("quit").await.map(drop);
        self.transport.shutdown(Duration::from_secs(5)).await;
        result
    }

    /// Sends `command` and returns the response body lines.
    ///
    /// The first returned line is the text following `=` on the header line.
    async fn exchange(&mut self, command: &str) -> Result<Vec<String>, ProtocolError> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.transport.send(&format!("{} {}", id, command)).await?;
        let deadline = Instant::now() + self.response_timeout;

        let (header, body) = loop {
            let header = self.next_header(deadline, command).await?;
            let body = self.read_body(&header, deadline, command).await?;
            match response_id(&header) {
                Some(got) if got != id => {
                    warn!(command, expected = id, got, "Discarding stale engine reply");
                }
                _ => break (header, body),
            }
        };

        if header.starts_with('?') {
            warn!(command, reply = %body.join(" "), "Engine rejected command");
            return Err(ProtocolError::new(
                ProtocolErrorKind::Rejected,
                format!("engine rejected `{}`: {}", command, body.join(" ")),
            ));
        }
        Ok(body)
    }

    async fn next_header(&mut self, deadline: Instant, command: &str) -> Result<String, ProtocolError> {
        loop {
            let line = self.next_line(deadline, command).await?;
            let line = line.trim();
            if line.starts_with('=') || line.starts_with('?') {
                return Ok(line.to_string());
            }
            if !line.is_empty() {
                debug!(command, line, "Skipping unexpected engine output");
            }
        }
    }

    async fn read_body(
        &mut self,
        header: &str,
        deadline: Instant,
        command: &str,
    ) -> Result<Vec<String>, ProtocolError> {
        let mut body = vec![strip_header(header).to_string()];
        loop {
            let line = self.next_line(deadline, command).await?;
            if line.trim().is_empty() {
                return Ok(body);
            }
            body.push(line.trim_end().to_string());
        }
    }

    async fn next_line(&mut self, deadline: Instant, command: &str) -> Result<String, ProtocolError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        self.transport
            .read_line(Stream::Stdout, remaining)
            .await?
            .ok_or_else(|| {
                ProtocolError::new(
                    ProtocolErrorKind::Closed,
                    format!("engine output ended while awaiting reply to `{}`", command),
                )
            })
    }
}

/// Drops the `=`/`?` marker and an optional numeric command id.
fn strip_header(header: &str) -> &str {
    let rest = &header[1..];
    rest.trim_start_matches(|c: char| c.is_ascii_digit()).trim()
}

/// Command id echoed right after the `=`/`?` marker, if any.
fn response_id(header: &str) -> Option<u32> {
    let digits: String = header[1..].chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

fn first_line(body: &[String]) -> &str {
    body.first().map(String::as_str).unwrap_or_default()
}
