//! Engine process ownership and bounded line I/O over its standard streams.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, instrument, trace, warn};

type Reader = Lines<BufReader<Box<dyn AsyncRead + Send + Unpin>>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// How to launch the engine process.
#[derive(Debug, Clone, Default, PartialEq, Getters, Serialize, Deserialize)]
pub struct EngineCommand {
    /// Program followed by its arguments.
    #[serde(default)]
    argv: Vec<String>,

    /// Extra environment variables for the child.
    #[serde(default)]
    env: BTreeMap<String, String>,

    /// Working directory for the child.
    #[serde(default)]
    cwd: Option<PathBuf>,
}

impl EngineCommand {
    /// Creates a command from a program and its arguments.
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Adds an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// Which of the child's output streams to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stream {
    /// Protocol responses.
    #[display("stdout")]
    Stdout,
    /// Diagnostics and the readiness banner.
    #[display("stderr")]
    Stderr,
}

/// Owns the engine process and its three byte streams.
pub struct Transport {
    child: Option<Child>,
    stdin: Option<Writer>,
    stdout: Reader,
    stderr: Option<Reader>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("pid", &self.child.as_ref().and_then(|c| c.id()))
            .field("stdin_open", &self.stdin.is_some())
            .field("stderr_attached", &self.stderr.is_some())
            .finish()
    }
}

impl Transport {
    /// Spawns the engine with all three streams piped.
    #[instrument(skip(command), fields(program = ?command.argv.first()))]
    pub fn start(command: &EngineCommand) -> Result<Self, TransportError> {
        let (program, args) = command.argv.split_first().ok_or_else(|| {
            TransportError::new(TransportErrorKind::Launch, "empty engine command".to_string())
        })?;

        info!(program = %program, args = ?args, "Starting engine process");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .envs(&command.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = cmd.spawn().map_err(|e| {
            TransportError::new(
                TransportErrorKind::Launch,
                format!("failed to spawn {}: {}", program, e),
            )
        })?;

        let missing = |name: &str| {
            TransportError::new(TransportErrorKind::Launch, format!("failed to capture {}", name))
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        debug!(pid = ?child.id(), "Engine process spawned");

        let mut transport = Self::from_streams(stdin, stdout, stderr);
        transport.child = Some(child);
        Ok(transport)
    }

    /// Wraps already-connected streams; no process is owned.
    pub fn from_streams<W, O, E>(stdin: W, stdout: O, stderr: E) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
        O: AsyncRead + Send + Unpin + 'static,
        E: AsyncRead + Send + Unpin + 'static,
    {
        let stdout: Box<dyn AsyncRead + Send + Unpin> = Box::new(stdout);
        let stderr: Box<dyn AsyncRead + Send + Unpin> = Box::new(stderr);
        Self {
            child: None,
            stdin: Some(Box::new(stdin)),
            stdout: BufReader::new(stdout).lines(),
            stderr: Some(BufReader::new(stderr).lines()),
        }
    }

    /// Writes one newline-terminated line and flushes it to the child.
    #[instrument(skip(self))]
    pub async fn send(&mut self, line: &str) -> Result<(), TransportError> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            TransportError::new(TransportErrorKind::Io, "engine stdin already closed".to_string())
        })?;

        let io_err = |e: std::io::Error| {
            TransportError::new(TransportErrorKind::Io, format!("write to engine failed: {}", e))
        };
        stdin.write_all(line.as_bytes()).await.map_err(io_err)?;
        stdin.write_all(b"\n").await.map_err(io_err)?;
        stdin.flush().await.map_err(io_err)?;
        trace!(line, "Sent");
        Ok(())
    }

    /// Reads one line from `stream`, waiting at most `deadline`.
    ///
    /// Returns `Ok(None)` once the stream has ended.
    #[instrument(skip(self))]
    pub async fn read_line(
        &mut self,
        stream: Stream,
        deadline: Duration,
    ) -> Result<Option<String>, TransportError> {
        let reader = match stream {
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => self.stderr.as_mut().ok_or_else(|| {
                TransportError::new(
                    TransportErrorKind::Io,
                    "stderr is being drained and cannot be read".to_string(),
                )
            })?,
        };

        match timeout(deadline, reader.next_line()).await {
            Ok(Ok(line)) => {
                trace!(?line, "Received");
                Ok(line)
            }
            Ok(Err(e)) => Err(TransportError::new(
                TransportErrorKind::Io,
                format!("read from engine {} failed: {}", stream, e),
            )),
            Err(_) => Err(TransportError::new(
                TransportErrorKind::Timeout,
                format!("no line on engine {} within {:?}", stream, deadline),
            )),
        }
    }

    /// Blocks until a stderr line satisfies `is_ready`.
    ///
    /// On success the rest of stderr is drained into the log in the
    /// background so the engine never stalls on a full pipe.
    #[instrument(skip(self, is_ready))]
    pub async fn await_ready<F>(&mut self, is_ready: F, wait: Duration) -> Result<(), TransportError>
    where
        F: Fn(&str) -> bool,
    {
        info!("Waiting for engine ready message");

        let mut stderr = self.stderr.take().ok_or_else(|| {
            TransportError::new(TransportErrorKind::NotReady, "stderr already consumed".to_string())
        })?;

        let scan = async {
            loop {
                match stderr.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        debug!(line, "Engine startup output");
                        if is_ready(line) {
                            return Ok(());
                        }
                    }
                    Ok(None) => {
                        return Err(TransportError::new(
                            TransportErrorKind::NotReady,
                            "engine exited before signalling readiness".to_string(),
                        ));
                    }
                    Err(e) => {
                        return Err(TransportError::new(
                            TransportErrorKind::NotReady,
                            format!("stderr read failed: {}", e),
                        ));
                    }
                }
            }
        };

        let outcome = timeout(wait, scan).await;
        match outcome {
            Ok(Ok(())) => {
                info!("Engine ready");
                tokio::spawn(drain_diagnostics(stderr));
                Ok(())
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransportError::new(
                TransportErrorKind::NotReady,
                format!("engine not ready after {:?}", wait),
            )),
        }
    }

    /// Closes stdin and waits briefly for the child to exit, killing it otherwise.
    #[instrument(skip(self))]
    pub async fn shutdown(&mut self, grace: Duration) {
        self.stdin = None;

        if let Some(mut child) = self.child.take() {
            match timeout(grace, child.wait()).await {
                Ok(Ok(status)) => info!(%status, "Engine exited"),
                Ok(Err(e)) => warn!(error = %e, "Failed to wait for engine"),
                Err(_) => {
                    warn!("Engine did not exit in time, killing it");
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "Failed to kill engine");
                    }
                }
            }
        }
    }
}

async fn drain_diagnostics(mut stderr: Reader) {
    while let Ok(Some(line)) = stderr.next_line().await {
        trace!(target: "go_attack::engine", line = %line.trim_end(), "Engine stderr");
    }
    debug!("Engine stderr closed");
}

/// Category of a [`TransportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TransportErrorKind {
    /// The process could not be created.
    #[display("launch")]
    Launch,
    /// The process never signalled readiness.
    #[display("not ready")]
    NotReady,
    /// Reading or writing a stream failed.
    #[display("io")]
    Io,
    /// A bounded read expired.
    #[display("timeout")]
    Timeout,
}

/// Transport failure with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Transport error ({}): {} at {}:{}", kind, message, file, line)]
pub struct TransportError {
    /// Failure category.
    pub kind: TransportErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl TransportError {
    /// Creates a new transport error with caller location tracking.
    #[track_caller]
    pub fn new(kind: TransportErrorKind, message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Whether this failure means the engine cannot be used at all.
    pub fn is_engine_unavailable(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Launch | TransportErrorKind::NotReady
        )
    }
}
