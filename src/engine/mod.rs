//! The engine collaborator: anything that can name a best move for a FEN.

pub mod uci;

use chess::ChessMove;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use uci::UciEngine;

/// Failure talking to the engine collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{0}")]
    Unavailable(String),
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    #[error("unexpected engine output: {0}")]
    Protocol(String),
}

/// A source of engine moves.
///
/// `fen` is a full six-field FEN. `Ok(None)` means the engine reports no move
/// exists in that position.
pub trait Engine: Send {
    fn best_move(&mut self, fen: &str) -> Result<Option<ChessMove>, EngineError>;
}

/// How to launch and configure the engine process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub path: PathBuf,
    pub skill_level: u8,
    pub depth: u8,
    pub threads: u8,
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./stockfish"),
            skill_level: 20,
            depth: 25,
            threads: 2,
            timeout: Duration::from_secs(60),
        }
    }
}
