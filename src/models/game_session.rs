use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece};
use log::info;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::SessionError;
use crate::game::utils::{color_to_string, has_insufficient_material};

/// 75 full moves without a capture or pawn move.
const SEVENTY_FIVE_MOVE_PLIES: u32 = 150;
const FIVEFOLD: usize = 5;

/// Final (or pending) result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    WhiteWin,
    BlackWin,
    Draw,
    InProgress,
}

impl Outcome {
    /// PGN-style result tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::WhiteWin => "1-0",
            Outcome::BlackWin => "0-1",
            Outcome::Draw => "1/2-1/2",
            Outcome::InProgress => "*",
        }
    }
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    SeventyFiveMoves,
    FivefoldRepetition,
}

/// Whose input the session is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ChoosingColor,
    HumanTurn,
    EngineTurn,
    GameOver,
}

/// Snapshot returned by terminal detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalStatus {
    pub is_over: bool,
    pub result: Outcome,
    pub termination: Option<Termination>,
}

/// One player's game against the engine.
///
/// Fields are private so the board only ever changes one legal ply at a time
/// and `is_over` always reflects the current board.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: String,
    board: Board,
    player_color: Color,
    move_history: Vec<ChessMove>,
    position_hashes: Vec<u64>,
    halfmove_clock: u32,
    start_fullmove: u32,
    start_side: Color,
    status: TerminalStatus,
}

impl GameSession {
    /// Standard starting position.
    pub fn new(player_color: Color) -> Self {
        Self::with_board(Board::default(), player_color, 0, 1)
    }

    /// Start from an arbitrary position given as FEN.
    pub fn from_fen(fen: &str, player_color: Color) -> Result<Self, SessionError> {
        let board = Board::from_str(fen)
            .map_err(|e| SessionError::InvalidInterchangeString(format!("{}: {:?}", fen, e)))?;
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let halfmove_clock = fields.get(4).and_then(|f| f.parse().ok()).unwrap_or(0);
        let fullmove = fields.get(5).and_then(|f| f.parse().ok()).unwrap_or(1);
        Ok(Self::with_board(board, player_color, halfmove_clock, fullmove))
    }

    fn with_board(board: Board, player_color: Color, halfmove_clock: u32, fullmove: u32) -> Self {
        let mut session = Self {
            id: Uuid::new_v4().to_string(),
            board,
            player_color,
            move_history: Vec::new(),
            position_hashes: vec![board.get_hash()],
            halfmove_clock,
            start_fullmove: fullmove.max(1),
            start_side: board.side_to_move(),
            status: TerminalStatus {
                is_over: false,
                result: Outcome::InProgress,
                termination: None,
            },
        };
        session.status = session.compute_status();
        info!(
            "Created session {} with player as {}",
            session.id,
            color_to_string(player_color)
        );
        session
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player_color(&self) -> Color {
        self.player_color
    }

    pub fn move_history(&self) -> &[ChessMove] {
        &self.move_history
    }

    pub fn last_move(&self) -> Option<ChessMove> {
        self.move_history.last().copied()
    }

    pub fn is_over(&self) -> bool {
        self.status.is_over
    }

    pub fn result(&self) -> Outcome {
        self.status.result
    }

    pub fn termination(&self) -> Option<Termination> {
        self.status.termination
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn is_human_turn(&self) -> bool {
        !self.is_over() && self.side_to_move() == self.player_color
    }

    /// The colour picker stays open until a full move pair has been played.
    pub fn color_selectable(&self) -> bool {
        !self.is_over() && self.move_history.len() < 2
    }

    pub fn phase(&self) -> Phase {
        if self.is_over() {
            Phase::GameOver
        } else if self.side_to_move() != self.player_color {
            Phase::EngineTurn
        } else if self.move_history.is_empty() {
            Phase::ChoosingColor
        } else {
            Phase::HumanTurn
        }
    }

    /// Legal moves in the current position; empty once the game is over.
    pub fn legal_moves(&self) -> Vec<ChessMove> {
        if self.is_over() {
            return Vec::new();
        }
        MoveGen::new_legal(&self.board).collect()
    }

    pub fn is_legal(&self, chess_move: ChessMove) -> bool {
        !self.is_over() && MoveGen::new_legal(&self.board).any(|m| m == chess_move)
    }

    /// Six-field FEN with the real half-move clock and full-move number.
    pub fn fen(&self) -> String {
        let placement = self.board.to_string();
        let fields: Vec<&str> = placement.split_whitespace().take(4).collect();
        let black_started = usize::from(self.start_side == Color::Black);
        let fullmove = self.start_fullmove as usize + (self.move_history.len() + black_started) / 2;
        format!("{} {} {}", fields.join(" "), self.halfmove_clock, fullmove)
    }

    /// Apply one ply. The move must come from the current legal set.
    pub(crate) fn push_move(&mut self, chess_move: ChessMove) -> Result<(), SessionError> {
        if !self.is_legal(chess_move) {
            return Err(SessionError::IllegalMove(chess_move.to_string()));
        }

        let resets_clock = self.board.piece_on(chess_move.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(chess_move.get_dest()).is_some();

        self.board = self.board.make_move_new(chess_move);
        self.halfmove_clock = if resets_clock { 0 } else { self.halfmove_clock + 1 };
        self.move_history.push(chess_move);
        self.position_hashes.push(self.board.get_hash());
        self.status = self.compute_status();
        Ok(())
    }

    /// Terminal status computed fresh from the board.
    pub fn terminal_status(&self) -> TerminalStatus {
        self.compute_status()
    }

    fn compute_status(&self) -> TerminalStatus {
        let termination = match self.board.status() {
            BoardStatus::Checkmate => Some(Termination::Checkmate),
            BoardStatus::Stalemate => Some(Termination::Stalemate),
            BoardStatus::Ongoing => {
                if has_insufficient_material(&self.board) {
                    Some(Termination::InsufficientMaterial)
                } else if self.halfmove_clock >= SEVENTY_FIVE_MOVE_PLIES {
                    Some(Termination::SeventyFiveMoves)
                } else if self.repetitions() >= FIVEFOLD {
                    Some(Termination::FivefoldRepetition)
                } else {
                    None
                }
            }
        };

        let result = match termination {
            None => Outcome::InProgress,
            // The side to move has been mated.
            Some(Termination::Checkmate) => match self.board.side_to_move() {
                Color::White => Outcome::BlackWin,
                Color::Black => Outcome::WhiteWin,
            },
            Some(_) => Outcome::Draw,
        };

        TerminalStatus {
            is_over: termination.is_some(),
            result,
            termination,
        }
    }

    fn repetitions(&self) -> usize {
        let current = self.board.get_hash();
        self.position_hashes.iter().filter(|&&h| h == current).count()
    }
}
