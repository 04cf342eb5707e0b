use chess::ChessMove;
use log::{debug, info, warn};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::runtime::{Builder, Runtime};
use tokio::time::{timeout_at, Instant};

use super::{Engine, EngineConfig, EngineError};
use crate::game::utils::parse_uci_move;

/// A UCI engine running as a child process.
///
/// The process is started on the first request and restarted after it dies.
/// Requests arrive on blocking threads, so the engine drives its pipes on a
/// small runtime of its own.
pub struct UciEngine {
    config: EngineConfig,
    runtime: Option<Runtime>,
    process: Option<EngineProcess>,
}

impl UciEngine {
    pub fn new(config: EngineConfig) -> std::io::Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            config,
            runtime: Some(runtime),
            process: None,
        })
    }

    fn search(&mut self, fen: &str) -> Result<Option<ChessMove>, EngineError> {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| EngineError::Unavailable("engine runtime is shut down".to_string()))?;
        runtime.block_on(run_search(&self.config, &mut self.process, fen))
    }
}

impl Engine for UciEngine {
    fn best_move(&mut self, fen: &str) -> Result<Option<ChessMove>, EngineError> {
        match self.search(fen) {
            Ok(best) => Ok(best),
            Err(EngineError::Unavailable(reason)) => {
                warn!("Engine unavailable ({}), restarting it once", reason);
                self.process = None;
                self.search(fen).map_err(|e| {
                    self.process = None;
                    e
                })
            }
            Err(e) => {
                // The process may still be searching; start fresh next time.
                warn!("Engine request failed: {}", e);
                self.process = None;
                Err(e)
            }
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Kill the child while its runtime is still alive.
        self.process = None;
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

async fn run_search(
    config: &EngineConfig,
    process: &mut Option<EngineProcess>,
    fen: &str,
) -> Result<Option<ChessMove>, EngineError> {
    if process.is_none() {
        *process = Some(EngineProcess::spawn(config).await?);
    }
    let engine = process
        .as_mut()
        .ok_or_else(|| EngineError::Unavailable("engine process not running".to_string()))?;

    engine.send(&format!("position fen {}", fen)).await?;
    engine.send(&format!("go depth {}", config.depth)).await?;

    let deadline = Instant::now() + config.timeout;
    loop {
        let line = engine.next_line(deadline, config.timeout).await?;
        if line.starts_with("bestmove") {
            return parse_bestmove(&line);
        }
    }
}

struct EngineProcess {
    // Held so the process is killed on drop
    _child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl EngineProcess {
    async fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        info!("Starting engine process {}", config.path.display());
        let mut child = Command::new(&config.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::Unavailable(format!(
                    "failed to start {}: {}",
                    config.path.display(),
                    e
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("no stdin handle".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unavailable("no stdout handle".to_string()))?;

        let mut process = Self {
            _child: child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        };
        process.handshake(config).await?;
        info!(
            "Engine ready (skill {}, depth {}, threads {})",
            config.skill_level, config.depth, config.threads
        );
        Ok(process)
    }

    async fn handshake(&mut self, config: &EngineConfig) -> Result<(), EngineError> {
        let deadline = Instant::now() + config.timeout;
        self.send("uci").await?;
        self.wait_for("uciok", deadline, config.timeout).await?;
        self.send(&format!("setoption name Threads value {}", config.threads))
            .await?;
        self.send(&format!("setoption name Skill Level value {}", config.skill_level))
            .await?;
        self.send("isready").await?;
        self.wait_for("readyok", deadline, config.timeout).await
    }

    async fn wait_for(
        &mut self,
        token: &str,
        deadline: Instant,
        limit: Duration,
    ) -> Result<(), EngineError> {
        loop {
            if self.next_line(deadline, limit).await?.trim() == token {
                return Ok(());
            }
        }
    }

    async fn send(&mut self, command: &str) -> Result<(), EngineError> {
        debug!("engine <- {}", command);
        let line = format!("{}\n", command);
        self.stdin
            .write_all(line.as_bytes())
            .await
            .map_err(|e| EngineError::Unavailable(format!("write to engine failed: {}", e)))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Unavailable(format!("write to engine failed: {}", e)))
    }

    async fn next_line(&mut self, deadline: Instant, limit: Duration) -> Result<String, EngineError> {
        match timeout_at(deadline, self.lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                debug!("engine -> {}", line);
                Ok(line)
            }
            Ok(Ok(None)) => Err(EngineError::Unavailable(
                "engine closed its output".to_string(),
            )),
            Ok(Err(e)) => Err(EngineError::Unavailable(format!(
                "read from engine failed: {}",
                e
            ))),
            Err(_) => Err(EngineError::Timeout(limit)),
        }
    }
}

/// Parse a `bestmove` line. `(none)` and the null move `0000` mean no move.
pub fn parse_bestmove(line: &str) -> Result<Option<ChessMove>, EngineError> {
    let mut parts = line.split_whitespace();
    if parts.next() != Some("bestmove") {
        return Err(EngineError::Protocol(line.to_string()));
    }
    match parts.next() {
        None | Some("(none)") | Some("0000") => Ok(None),
        Some(token) => parse_uci_move(token)
            .map(Some)
            .ok_or_else(|| EngineError::Protocol(line.to_string())),
    }
}
