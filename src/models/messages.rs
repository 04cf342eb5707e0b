use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::game::utils::{color_to_string, phase_to_string, termination_to_string};
use crate::models::game_session::{GameSession, Phase};

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientMessage {
    pub message_type: String,
    pub color: Option<String>,
    #[serde(rename = "move")]
    pub chess_move: Option<String>,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerMessage {
    pub message_type: String,
    pub session_id: Option<String>,
    pub fen: Option<String>,
    pub orientation: Option<String>,
    pub side_to_move: Option<String>,
    pub phase: Option<String>,
    pub legal_moves: Option<Vec<String>>,
    pub move_history: Option<Vec<String>>,
    pub last_move: Option<LastMove>,
    pub color_selectable: Option<bool>,
    pub game_over: Option<bool>,
    pub result: Option<String>,
    pub termination: Option<String>,
    pub error: Option<String>,
}

/// Last move information
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LastMove {
    pub from: String,
    pub to: String,
    pub uci: String,
}

impl ServerMessage {
    /// Full snapshot of a session for the client to redraw from.
    pub fn state(session: &GameSession) -> Self {
        // The move picker is only offered while the human is to move.
        let legal_moves = match session.phase() {
            Phase::HumanTurn | Phase::ChoosingColor => session
                .legal_moves()
                .iter()
                .map(|m| m.to_string())
                .collect(),
            Phase::EngineTurn | Phase::GameOver => Vec::new(),
        };

        ServerMessage {
            message_type: "state".to_string(),
            session_id: Some(session.id().to_string()),
            fen: Some(session.fen()),
            orientation: Some(color_to_string(session.player_color())),
            side_to_move: Some(color_to_string(session.side_to_move())),
            phase: Some(phase_to_string(session.phase())),
            legal_moves: Some(legal_moves),
            move_history: Some(session.move_history().iter().map(|m| m.to_string()).collect()),
            last_move: session.last_move().map(|m| LastMove {
                from: m.get_source().to_string(),
                to: m.get_dest().to_string(),
                uci: m.to_string(),
            }),
            color_selectable: Some(session.color_selectable()),
            game_over: Some(session.is_over()),
            result: Some(session.result().as_str().to_string()),
            termination: session.termination().map(termination_to_string),
            error: None,
        }
    }

    /// Error report carrying the current snapshot so the client can redraw.
    pub fn session_error(session: &GameSession, err: &SessionError) -> Self {
        ServerMessage {
            message_type: "error".to_string(),
            error: Some(err.user_message()),
            ..ServerMessage::state(session)
        }
    }

    /// Error that is not tied to any game state.
    pub fn error(text: impl Into<String>) -> Self {
        ServerMessage {
            message_type: "error".to_string(),
            session_id: None,
            fen: None,
            orientation: None,
            side_to_move: None,
            phase: None,
            legal_moves: None,
            move_history: None,
            last_move: None,
            color_selectable: None,
            game_over: None,
            result: None,
            termination: None,
            error: Some(text.into()),
        }
    }

    /// Snapshot after an operation: the state on success, an error otherwise.
    pub fn from_outcome(session: &GameSession, outcome: Result<(), SessionError>) -> Self {
        match outcome {
            Ok(()) => ServerMessage::state(session),
            Err(err) => ServerMessage::session_error(session, &err),
        }
    }
}
