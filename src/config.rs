//! Command-line and environment configuration.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::EngineConfig;

/// Play chess in the browser against a UCI engine
#[derive(Parser, Debug, Clone)]
#[command(name = "engine_chess_web")]
#[command(about = "Single-page chess against a UCI engine", long_about = None)]
#[command(version)]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "CHESS_BIND", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Path to the UCI engine binary
    #[arg(long, env = "STOCKFISH_PATH", default_value = "./stockfish")]
    pub engine_path: PathBuf,

    /// Engine skill level (0-20)
    #[arg(long, env = "ENGINE_SKILL_LEVEL", default_value_t = 20)]
    pub skill_level: u8,

    /// Search depth per engine move
    #[arg(long, env = "ENGINE_DEPTH", default_value_t = 25)]
    pub depth: u8,

    /// Engine worker threads
    #[arg(long, env = "ENGINE_THREADS", default_value_t = 2)]
    pub threads: u8,

    /// Seconds to wait for the engine before giving up on a turn
    #[arg(long, env = "ENGINE_TIMEOUT_SECS", default_value_t = 60)]
    pub engine_timeout_secs: u64,

    /// Directory with index.html and client assets
    #[arg(long, env = "CHESS_STATIC_DIR", default_value = "./static")]
    pub static_dir: PathBuf,
}

impl Config {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            path: self.engine_path.clone(),
            skill_level: self.skill_level.min(20),
            depth: self.depth,
            threads: self.threads.max(1),
            timeout: Duration::from_secs(self.engine_timeout_secs.max(1)),
        }
    }
}
