//! Turn sequencing for a single game against the engine.
//!
//! Every operation takes the session explicitly; the controller keeps no state
//! of its own. Operations that may consult the engine take it as a
//! `&mut dyn Engine` so callers decide how access to it is serialized.

use chess::{ChessMove, Color};
use log::{error, info, warn};

use crate::engine::Engine;
use crate::error::SessionError;
use crate::game::utils::parse_uci_move;
use crate::models::game_session::{GameSession, TerminalStatus};

/// Fresh game with the standard start. If the human plays black the engine
/// makes the first move before this returns.
///
/// A session is always produced; a failed first engine reply comes back next
/// to it and the session stays waiting on the engine.
pub fn initialize(
    player_color: Color,
    engine: &mut dyn Engine,
) -> (GameSession, Result<(), SessionError>) {
    let mut session = GameSession::new(player_color);
    let reply = if player_color == Color::Black {
        request_engine_move(&mut session, engine).map(|_| ())
    } else {
        Ok(())
    };
    (session, reply)
}

pub fn list_legal_moves(session: &GameSession) -> Vec<ChessMove> {
    session.legal_moves()
}

/// Validate and play the human's move, then let the engine answer.
///
/// An illegal or unparsable move leaves the session untouched. If the human
/// move lands but the engine fails, the error is returned and the session is
/// left on the engine's turn.
pub fn apply_human_move(
    session: &mut GameSession,
    move_text: &str,
    engine: &mut dyn Engine,
) -> Result<(), SessionError> {
    if session.is_over() {
        return Err(SessionError::GameOver);
    }
    if !session.is_human_turn() {
        return Err(SessionError::NotHumanTurn);
    }

    let chess_move = parse_uci_move(move_text)
        .ok_or_else(|| SessionError::IllegalMove(move_text.to_string()))?;
    if !session.is_legal(chess_move) {
        warn!("Session {}: illegal move {}", session.id(), move_text);
        return Err(SessionError::IllegalMove(move_text.to_string()));
    }

    session.push_move(chess_move)?;
    info!("Session {}: human played {}", session.id(), chess_move);

    if check_terminal_status(session).is_over {
        info!(
            "Session {}: game over after human move, result {}",
            session.id(),
            session.result().as_str()
        );
        return Ok(());
    }

    request_engine_move(session, engine).map(|_| ())
}

/// Ask the engine for its move in the current position and play it.
///
/// Returns the move played, or `None` if the engine had nothing to play.
pub fn request_engine_move(
    session: &mut GameSession,
    engine: &mut dyn Engine,
) -> Result<Option<ChessMove>, SessionError> {
    if session.is_over() {
        return Err(SessionError::GameOver);
    }
    if session.is_human_turn() {
        return Err(SessionError::NotHumanTurn);
    }

    let fen = session.fen();
    info!("Session {}: asking engine for a move in {}", session.id(), fen);

    let best = engine.best_move(&fen).map_err(|e| {
        let err = SessionError::from(e);
        log_engine_failure(session, &err);
        err
    })?;

    let chess_move = match best {
        Some(chess_move) => chess_move,
        None => {
            warn!("Session {}: engine returned no move", session.id());
            return Ok(None);
        }
    };

    if !session.is_legal(chess_move) {
        let err = SessionError::InvalidInterchangeString(format!(
            "engine replied {} which is not legal in {}",
            chess_move, fen
        ));
        log_engine_failure(session, &err);
        return Err(err);
    }

    session.push_move(chess_move)?;
    info!("Session {}: engine played {}", session.id(), chess_move);
    Ok(Some(chess_move))
}

pub fn check_terminal_status(session: &GameSession) -> TerminalStatus {
    session.terminal_status()
}

/// Throw the game away and start again with the human as white.
pub fn restart(session: &mut GameSession) {
    info!("Session {}: restarting", session.id());
    // White moves first, so initialize(white) never consults the engine.
    *session = GameSession::new(Color::White);
}

/// Switch sides before the first move pair is complete.
pub fn choose_color(
    session: &mut GameSession,
    player_color: Color,
    engine: &mut dyn Engine,
) -> Result<(), SessionError> {
    if !session.color_selectable() {
        return Err(SessionError::ColorLocked);
    }
    let (fresh, reply) = initialize(player_color, engine);
    *session = fresh;
    reply
}

fn log_engine_failure(session: &GameSession, err: &SessionError) {
    match err {
        SessionError::InvalidInterchangeString(_) => {
            error!("Session {}: {}", session.id(), err)
        }
        _ => warn!("Session {}: {}", session.id(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FirstLegalEngine, ScriptedEngine};
    use crate::engine::EngineError;
    use crate::models::game_session::{Outcome, Phase};
    use chess::Square;
    use std::str::FromStr;
    use std::time::Duration;

    fn mv(s: &str) -> ChessMove {
        ChessMove::from_str(s).unwrap()
    }

    #[test]
    fn test_initialize_white_does_not_call_engine() {
        let mut engine = FirstLegalEngine::default();
        let (session, reply) = initialize(Color::White, &mut engine);
        assert!(reply.is_ok());
        assert_eq!(engine.calls, 0);
        assert!(session.move_history().is_empty());
        assert!(!check_terminal_status(&session).is_over);
    }

    #[test]
    fn test_initialize_black_engine_moves_first() {
        let mut engine = FirstLegalEngine::default();
        let (session, reply) = initialize(Color::Black, &mut engine);
        assert!(reply.is_ok());
        assert_eq!(engine.calls, 1);
        assert_eq!(session.move_history().len(), 1);
        assert_eq!(session.phase(), Phase::HumanTurn);
        assert_eq!(session.side_to_move(), Color::Black);

        // Legal set reflects the engine's reply: black to move.
        let moves = list_legal_moves(&session);
        assert_eq!(moves.len(), 20);
        assert!(moves
            .iter()
            .all(|m| session.board().color_on(m.get_source()) == Some(Color::Black)));
    }

    #[test]
    fn test_initialize_black_with_dead_engine() {
        let mut engine =
            ScriptedEngine::new(vec![Err(EngineError::Unavailable("gone".to_string()))]);
        let (session, reply) = initialize(Color::Black, &mut engine);
        assert_eq!(
            reply,
            Err(SessionError::EngineUnavailable("gone".to_string()))
        );
        assert_eq!(session.phase(), Phase::EngineTurn);
        assert!(session.move_history().is_empty());
    }

    #[test]
    fn test_e2e4_gets_one_reply() {
        let mut engine = ScriptedEngine::new(vec![Ok(Some(mv("e7e5")))]);
        let (mut session, _) = initialize(Color::White, &mut engine);
        apply_human_move(&mut session, "e2e4", &mut engine).unwrap();

        assert_eq!(engine.calls, 1);
        assert_eq!(session.move_history(), &[mv("e2e4"), mv("e7e5")]);
        assert!(!session.is_over());
        assert_eq!(session.phase(), Phase::HumanTurn);
    }

    #[test]
    fn test_engine_receives_full_fen() {
        let mut engine = FirstLegalEngine::default();
        let (mut session, _) = initialize(Color::White, &mut engine);
        apply_human_move(&mut session, "e2e4", &mut engine).unwrap();
        let fen = &engine.fens[0];
        assert!(fen.starts_with("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq"));
        assert!(fen.ends_with(" 0 1"));
    }

    #[test]
    fn test_illegal_move_changes_nothing() {
        let mut engine = FirstLegalEngine::default();
        let (mut session, _) = initialize(Color::White, &mut engine);
        let before = session.fen();

        for bad in ["e2e5", "e7e5", "nonsense", ""] {
            let err = apply_human_move(&mut session, bad, &mut engine).unwrap_err();
            assert_eq!(err, SessionError::IllegalMove(bad.to_string()));
        }
        assert_eq!(session.fen(), before);
        assert!(session.move_history().is_empty());
        assert_eq!(engine.calls, 0);
    }

    #[test]
    fn test_mating_move_skips_engine() {
        let mut engine = FirstLegalEngine::default();
        let mut session =
            GameSession::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", Color::White).unwrap();
        apply_human_move(&mut session, "a1a8", &mut engine).unwrap();

        let status = check_terminal_status(&session);
        assert!(status.is_over);
        assert_eq!(status.result, Outcome::WhiteWin);
        assert_eq!(engine.calls, 0);
        assert_eq!(
            apply_human_move(&mut session, "g1g2", &mut engine),
            Err(SessionError::GameOver)
        );
    }

    #[test]
    fn test_engine_failure_then_retry() {
        let mut engine = ScriptedEngine::new(vec![
            Err(EngineError::Timeout(Duration::from_secs(5))),
            Ok(Some(mv("e7e5"))),
        ]);
        let (mut session, _) = initialize(Color::White, &mut engine);

        let err = apply_human_move(&mut session, "e2e4", &mut engine).unwrap_err();
        assert_eq!(err, SessionError::EngineTimeout(Duration::from_secs(5)));
        assert_eq!(session.move_history().len(), 1);
        assert_eq!(session.phase(), Phase::EngineTurn);
        assert_eq!(
            apply_human_move(&mut session, "d2d4", &mut engine),
            Err(SessionError::NotHumanTurn)
        );

        let played = request_engine_move(&mut session, &mut engine).unwrap();
        assert_eq!(played, Some(mv("e7e5")));
        assert_eq!(session.phase(), Phase::HumanTurn);
    }

    #[test]
    fn test_engine_no_move_is_noop() {
        let mut engine = ScriptedEngine::new(vec![Ok(None)]);
        let mut session = GameSession::new(Color::Black);
        assert_eq!(request_engine_move(&mut session, &mut engine), Ok(None));
        assert!(session.move_history().is_empty());
    }

    #[test]
    fn test_engine_illegal_reply_rejected() {
        let mut engine = ScriptedEngine::new(vec![Ok(Some(ChessMove::new(
            Square::E2,
            Square::E5,
            None,
        )))]);
        let mut session = GameSession::new(Color::Black);
        let err = request_engine_move(&mut session, &mut engine).unwrap_err();
        assert!(matches!(err, SessionError::InvalidInterchangeString(_)));
        assert!(session.move_history().is_empty());
    }

    #[test]
    fn test_restart_matches_fresh_white_game() {
        let mut engine = FirstLegalEngine::default();
        let (mut session, _) = initialize(Color::Black, &mut engine);
        let reply = list_legal_moves(&session)[0].to_string();
        apply_human_move(&mut session, &reply, &mut engine).unwrap();
        let old_id = session.id().to_string();

        restart(&mut session);
        let (fresh, _) = initialize(Color::White, &mut engine);
        assert_ne!(session.id(), old_id);
        assert_eq!(session.player_color(), Color::White);
        assert_eq!(session.fen(), fresh.fen());
        assert!(session.move_history().is_empty());
        assert_eq!(session.phase(), fresh.phase());
    }

    #[test]
    fn test_choose_color_only_before_first_pair() {
        let mut engine = FirstLegalEngine::default();
        let (mut session, _) = initialize(Color::White, &mut engine);
        choose_color(&mut session, Color::Black, &mut engine).unwrap();
        assert_eq!(session.player_color(), Color::Black);
        assert_eq!(session.move_history().len(), 1);

        // Black may still flip back before replying.
        choose_color(&mut session, Color::White, &mut engine).unwrap();
        assert_eq!(session.player_color(), Color::White);

        apply_human_move(&mut session, "d2d4", &mut engine).unwrap();
        assert_eq!(
            choose_color(&mut session, Color::Black, &mut engine),
            Err(SessionError::ColorLocked)
        );
    }

    #[test]
    fn test_turns_alternate_until_game_over() {
        let mut engine = FirstLegalEngine::default();
        let (mut session, _) = initialize(Color::White, &mut engine);

        while !session.is_over() && session.move_history().len() < 300 {
            let moves = list_legal_moves(&session);
            assert!(!moves.is_empty());
            let before = session.move_history().len();
            match apply_human_move(&mut session, &moves[0].to_string(), &mut engine) {
                Ok(()) => {}
                Err(e) => panic!("unexpected error {}", e),
            }
            let applied = session.move_history().len() - before;
            assert!(applied == 2 || (applied == 1 && session.is_over()));
        }

        // Every even ply was white's (the human's), every odd ply black's.
        let mut replay = GameSession::new(Color::White);
        for (ply, m) in session.move_history().iter().enumerate() {
            let mover = replay.side_to_move();
            assert_eq!(mover == Color::White, ply % 2 == 0);
            replay.push_move(*m).unwrap();
        }
        assert_eq!(list_legal_moves(&session).is_empty(), session.is_over());
    }
}
