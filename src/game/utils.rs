use chess::{Board, ChessMove, Color, Piece, ALL_SQUARES};
use std::str::FromStr;

use crate::models::game_session::{Phase, Termination};

/// Convert a chess color to a string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Parse the colour names the client sends
pub fn parse_color(name: &str) -> Option<Color> {
    match name.trim().to_lowercase().as_str() {
        "white" => Some(Color::White),
        "black" => Some(Color::Black),
        _ => None,
    }
}

/// Parse coordinate notation such as `e2e4` or `e7e8q`
pub fn parse_uci_move(text: &str) -> Option<ChessMove> {
    let text = text.trim();
    if !text.is_ascii() || !(text.len() == 4 || text.len() == 5) {
        return None;
    }
    ChessMove::from_str(&text.to_lowercase()).ok()
}

pub fn phase_to_string(phase: Phase) -> String {
    match phase {
        Phase::ChoosingColor => "choosing_color".to_string(),
        Phase::HumanTurn => "human_turn".to_string(),
        Phase::EngineTurn => "engine_turn".to_string(),
        Phase::GameOver => "game_over".to_string(),
    }
}

pub fn termination_to_string(termination: Termination) -> String {
    match termination {
        Termination::Checkmate => "checkmate".to_string(),
        Termination::Stalemate => "stalemate".to_string(),
        Termination::InsufficientMaterial => "insufficient_material".to_string(),
        Termination::SeventyFiveMoves => "seventy_five_moves".to_string(),
        Termination::FivefoldRepetition => "fivefold_repetition".to_string(),
    }
}

/// Check if neither side has enough material left to deliver mate
pub fn has_insufficient_material(board: &Board) -> bool {
    let mut knights = [0u8; 2];
    let mut bishops = [0u8; 2];
    // Bishops seen on light / dark squares, either colour
    let mut bishop_on_light = false;
    let mut bishop_on_dark = false;

    for square in ALL_SQUARES.iter() {
        let piece = match board.piece_on(*square) {
            Some(piece) => piece,
            None => continue,
        };
        let side = match board.color_on(*square) {
            Some(Color::White) => 0,
            Some(Color::Black) => 1,
            None => continue,
        };

        match piece {
            Piece::King => {}
            Piece::Pawn | Piece::Rook | Piece::Queen => return false,
            Piece::Knight => knights[side] += 1,
            Piece::Bishop => {
                bishops[side] += 1;
                if (square.get_rank().to_index() + square.get_file().to_index()) % 2 == 1 {
                    bishop_on_light = true;
                } else {
                    bishop_on_dark = true;
                }
            }
        }
    }

    let bishops_one_colour = !(bishop_on_light && bishop_on_dark);
    let cannot_mate = |side: usize| {
        let other = 1 - side;
        if knights[side] > 0 {
            // A lone knight only against a bare king
            knights[side] == 1 && bishops[side] == 0 && knights[other] + bishops[other] == 0
        } else if bishops[side] > 0 {
            // Any number of bishops, all on one square colour, and no knights
            bishops_one_colour && knights[other] == 0
        } else {
            true
        }
    };

    cannot_mate(0) && cannot_mate(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::Square;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).unwrap()
    }

    #[test]
    fn test_start_position_has_material() {
        assert!(!has_insufficient_material(&Board::default()));
    }

    #[test]
    fn test_lone_minor_pieces() {
        assert!(has_insufficient_material(&board("8/8/8/4k3/8/8/8/4K3 w - - 0 1")));
        assert!(has_insufficient_material(&board("8/8/8/4k3/8/8/8/2B1K3 w - - 0 1")));
        assert!(has_insufficient_material(&board("8/8/8/4k3/8/8/8/1n2K3 w - - 0 1")));
    }

    #[test]
    fn test_bishops_by_square_colour() {
        // c1 and f8 are both dark squares
        assert!(has_insufficient_material(&board("5b2/8/8/4k3/8/8/8/2B1K3 w - - 0 1")));
        // c1 dark, c8 light
        assert!(!has_insufficient_material(&board("2b5/8/8/4k3/8/8/8/2B1K3 w - - 0 1")));
        // a1 and c1: two bishops on dark squares against a bare king
        assert!(has_insufficient_material(&board("8/8/4k3/8/8/8/8/B1B1K3 w - - 0 1")));
        // a1, c1 and f8 all dark, split between the sides
        assert!(has_insufficient_material(&board("5b2/8/4k3/8/8/8/8/B1B1K3 w - - 0 1")));
        // a1 dark, b1 light
        assert!(!has_insufficient_material(&board("8/8/4k3/8/8/8/8/BB2K3 w - - 0 1")));
    }

    #[test]
    fn test_mating_material() {
        assert!(!has_insufficient_material(&board("8/8/8/4k3/8/8/8/R3K3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("8/8/8/4k3/8/8/4P3/4K3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("8/8/8/4k3/8/8/8/1NB1K3 w - - 0 1")));
        assert!(!has_insufficient_material(&board("8/8/8/4k3/8/8/8/1N1NK3 w - - 0 1")));
        // Knight against a bishop can still mate in the corner
        assert!(!has_insufficient_material(&board("5b2/8/8/4k3/8/8/8/1N2K3 w - - 0 1")));
    }

    #[test]
    fn test_parse_uci_move() {
        assert_eq!(
            parse_uci_move("e2e4"),
            Some(ChessMove::new(Square::E2, Square::E4, None))
        );
        assert_eq!(
            parse_uci_move("E7E8Q"),
            Some(ChessMove::new(Square::E7, Square::E8, Some(Piece::Queen)))
        );
        assert_eq!(parse_uci_move(""), None);
        assert_eq!(parse_uci_move("e2"), None);
        assert_eq!(parse_uci_move("é2e4"), None);
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("White"), Some(Color::White));
        assert_eq!(parse_color(" black "), Some(Color::Black));
        assert_eq!(parse_color("green"), None);
    }
}
