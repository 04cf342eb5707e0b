//! Browser chess against a UCI engine.
//!
//! Rules come from the `chess` crate and moves for the engine's side from an
//! external UCI process. This crate sequences turns, validates the human's
//! moves and hosts the game over HTTP and WebSocket.

pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod models;
pub mod routes;
pub mod websocket;

pub use error::SessionError;
