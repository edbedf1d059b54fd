//! In-process GTP engine used by the integration tests.
//!
//! The engine runs on `tokio::io::duplex` pipes, keeps its own [`GoGame`]
//! and answers `genmove` deterministically: it passes right after a pass,
//! otherwise it plays the first legal point (row-major) that is not one of
//! its own eyes. Command ids are echoed in the reply header.

#![allow(dead_code)]

use go_attack::{
    AttackConfig, Channel, Color, EngineCommand, EngineConfig, GoGame, GtpClient, Move,
    PolicyKind, Transport,
};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex};

const PIPE_CAPACITY: usize = 64 * 1024;

/// Behaviour switches for the fake engine.
#[derive(Debug, Clone, Default)]
pub struct FakeOptions {
    /// Added to the true `white - black` margin reported by `final_score`.
    pub score_skew: f64,
    /// Answer every `play` with `? illegal move`.
    pub reject_plays: bool,
    /// Close all pipes after this many commands.
    pub hang_up_after: Option<usize>,
}

/// What the fake engine has seen.
#[derive(Debug, Default)]
pub struct EngineState {
    /// Every command received, in order.
    pub log: Vec<String>,
    /// Snapshot of each game taken when `clear_board` arrived.
    pub finished: Vec<GoGame>,
    game: Option<GoGame>,
    size: usize,
    komi: f64,
}

/// Handle on a running fake engine.
#[derive(Debug, Clone)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    /// Commands received so far.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().expect("engine state poisoned").log.clone()
    }

    /// Games the engine saw cleared, in order.
    pub fn finished_games(&self) -> Vec<GoGame> {
        self.state
            .lock()
            .expect("engine state poisoned")
            .finished
            .clone()
    }

    /// Number of times `command` (first word) was received.
    pub fn count(&self, command: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(command))
            .count()
    }
}

/// Starts a fake engine and returns the client-side transport.
pub fn spawn_fake_engine(options: FakeOptions) -> (Transport, FakeEngine) {
    let (client_in, engine_in) = duplex(PIPE_CAPACITY);
    let (engine_out, client_out) = duplex(PIPE_CAPACITY);
    let (engine_err, client_err) = duplex(PIPE_CAPACITY);

    let state = Arc::new(Mutex::new(EngineState {
        size: 19,
        komi: 7.5,
        ..EngineState::default()
    }));
    tokio::spawn(serve(engine_in, engine_out, engine_err, Arc::clone(&state), options));

    let transport = Transport::from_streams(client_in, client_out, client_err);
    (transport, FakeEngine { state })
}

/// Fake engine behind a ready [`Channel`].
pub async fn ready_channel(options: FakeOptions) -> (Channel, FakeEngine) {
    let (mut transport, engine) = spawn_fake_engine(options);
    transport
        .await_ready(|line| line.starts_with("GTP ready"), Duration::from_secs(5))
        .await
        .expect("fake engine never became ready");
    let channel = GtpClient::new(transport, Duration::from_secs(5)).into_channel();
    (channel, engine)
}

/// A transport whose engine side has already written `replies` to stdout.
///
/// Returns the engine ends of stdin and stdout so a test can keep them open
/// or drop them.
pub async fn scripted(replies: &str) -> (Transport, DuplexStream, DuplexStream) {
    let (client_in, engine_in) = duplex(PIPE_CAPACITY);
    let (mut engine_out, client_out) = duplex(PIPE_CAPACITY);
    let (_engine_err, client_err) = duplex(PIPE_CAPACITY);
    engine_out
        .write_all(replies.as_bytes())
        .await
        .expect("Failed to script replies");
    let transport = Transport::from_streams(client_in, client_out, client_err);
    (transport, engine_in, engine_out)
}

/// A 9x9 configuration pointing at a placeholder engine command.
pub fn test_config(strategy: PolicyKind, victim: Color) -> AttackConfig {
    let engine = EngineConfig::new(EngineCommand::new(vec!["fake-engine".to_string()]))
        .with_timeouts(Duration::from_secs(5), Duration::from_secs(5));
    AttackConfig::default()
        .with_engine(engine)
        .with_board_size(9)
        .with_num_games(3)
        .with_turns_before_pass(10)
        .with_strategy(strategy)
        .with_victim(victim)
}

async fn serve(
    stdin: DuplexStream,
    mut stdout: DuplexStream,
    mut stderr: DuplexStream,
    state: Arc<Mutex<EngineState>>,
    options: FakeOptions,
) {
    let banner = b"Loading model\nGTP ready, beginning main protocol loop\n";
    if stderr.write_all(banner).await.is_err() {
        return;
    }

    let mut lines = BufReader::new(stdin).lines();
    let mut received = 0;
    while let Ok(Some(line)) = lines.next_line().await {
        received += 1;
        if options.hang_up_after.is_some_and(|limit| received > limit) {
            return;
        }

        let (id, command) = split_id(line.trim());
        let reply = {
            let mut state = state.lock().expect("engine state poisoned");
            state.log.push(command.to_string());
            state.handle(command, &options)
        };
        let text = match reply {
            Ok(body) => format!("={} {}\n\n", id, body),
            Err(message) => format!("?{} {}\n\n", id, message),
        };
        if stdout.write_all(text.as_bytes()).await.is_err() {
            return;
        }
        if command == "quit" {
            return;
        }
    }
}

impl EngineState {
    fn handle(&mut self, line: &str, options: &FakeOptions) -> Result<String, String> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        match command {
            "boardsize" => {
                self.size = args
                    .first()
                    .and_then(|s| s.parse().ok())
                    .ok_or("unacceptable size")?;
                self.game = None;
                Ok(String::new())
            }
            "komi" => {
                self.komi = args
                    .first()
                    .and_then(|s| s.parse().ok())
                    .ok_or("syntax error")?;
                Ok(String::new())
            }
            "clear_board" => {
                if let Some(game) = self.game.take() {
                    self.finished.push(game);
                }
                Ok(String::new())
            }
            "play" => {
                if options.reject_plays {
                    return Err("illegal move".to_string());
                }
                let color = parse_arg::<Color>(args.first())?;
                let mv = parse_arg::<Move>(args.get(1))?;
                let game = self.game()?;
                if game.current_player() != color {
                    return Err("illegal move".to_string());
                }
                game.play_move(mv).map_err(|_| "illegal move".to_string())?;
                Ok(String::new())
            }
            "genmove" => {
                let color = parse_arg::<Color>(args.first())?;
                let game = self.game()?;
                if game.current_player() != color {
                    return Err("not your turn".to_string());
                }
                let mv = choose(game, color);
                game.play_move(mv).map_err(|e| e.message)?;
                Ok(mv.to_string())
            }
            "reg_genmove" => {
                let color = parse_arg::<Color>(args.first())?;
                let game = self.game()?;
                Ok(choose(game, color).to_string())
            }
            "final_score" => {
                let (black, white) = self.game()?.score();
                let margin = white - black + options.score_skew;
                Ok(if margin > 0.0 {
                    format!("W+{}", margin)
                } else if margin < 0.0 {
                    format!("B+{}", -margin)
                } else {
                    "0".to_string()
                })
            }
            "showboard" => Ok(format!("\n{}", self.game()?)),
            "quit" => Ok(String::new()),
            _ => Err("unknown command".to_string()),
        }
    }

    fn game(&mut self) -> Result<&mut GoGame, String> {
        if self.game.is_none() {
            self.game = Some(GoGame::new(self.size, self.komi).map_err(|e| e.message)?);
        }
        self.game.as_mut().ok_or_else(|| "no game".to_string())
    }
}

/// Splits an optional leading command id off `line`.
fn split_id(line: &str) -> (&str, &str) {
    match line.split_once(' ') {
        Some((id, rest)) if id.bytes().all(|b| b.is_ascii_digit()) => (id, rest.trim()),
        _ => ("", line),
    }
}

fn choose(game: &GoGame, color: Color) -> Move {
    if matches!(game.history().last(), Some((_, Move::Pass))) {
        return Move::Pass;
    }
    game.legal_points()
        .into_iter()
        .find(|&p| !game.is_own_eye(p, color))
        .map_or(Move::Pass, Move::Play)
}

fn parse_arg<T: FromStr>(arg: Option<&&str>) -> Result<T, String> {
    arg.and_then(|s| s.parse().ok())
        .ok_or_else(|| "syntax error".to_string())
}
