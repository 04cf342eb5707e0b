use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use chess::Color;
use log::{error, info, warn};
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::SessionError;
use crate::game::controller;
use crate::game::utils::parse_color;
use crate::models::{AppState, ClientMessage, GameSession, Phase, ServerMessage, SharedSession};

/// WebSocket handler for one player's game
pub struct ChessWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    pub session: SharedSession,
}

impl ChessWebSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            app_state,
            session: Arc::new(Mutex::new(GameSession::new(Color::White))),
        }
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let total_sessions = self.app_state.register(&self.id, self.session.clone());
        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total_sessions);
        self.send_state(ctx);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        let total_sessions = self.app_state.unregister(&self.id);
        info!("WebSocket connection closed: {}", self.id);
        info!("Total active sessions: {}", total_sessions);
        Running::Stop
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                info!("Received text message on {}: {}", self.id, text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => self.handle_message(client_msg, ctx),
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        send(ctx, &ServerMessage::error(format!("Invalid message format: {}", e)));
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                send(ctx, &ServerMessage::error("Binary messages are not supported"));
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

impl ChessWebSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg.message_type.as_str() {
            "state" => self.send_state(ctx),
            "choose_color" => self.handle_choose_color(msg, ctx),
            "move" => self.handle_move(msg, ctx),
            "retry_engine" => self.handle_retry_engine(ctx),
            "restart" => self.handle_restart(ctx),
            _ => {
                warn!("Unknown message type: {}", msg.message_type);
                send(
                    ctx,
                    &ServerMessage::error(format!("Unknown message type: {}", msg.message_type)),
                );
            }
        }
    }

    fn handle_choose_color(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let color = match msg.color.as_deref().and_then(parse_color) {
            Some(color) => color,
            None => {
                warn!("Invalid colour in {:?}", msg);
                send(ctx, &ServerMessage::error("Colour must be white or black"));
                return;
            }
        };
        self.run_turn(ctx, move |session, engine| {
            controller::choose_color(session, color, engine)
        });
    }

    fn handle_move(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let move_text = match msg.chess_move {
            Some(m) if !m.trim().is_empty() => m,
            _ => {
                warn!("No move provided");
                send(ctx, &ServerMessage::error("No move provided"));
                return;
            }
        };
        self.run_turn(ctx, move |session, engine| {
            controller::apply_human_move(session, &move_text, engine)
        });
    }

    fn handle_retry_engine(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        self.run_turn(ctx, |session, engine| {
            // Nothing to retry; the reply is just the current state.
            if session.phase() != Phase::EngineTurn {
                return Ok(());
            }
            controller::request_engine_move(session, engine).map(|_| ())
        });
    }

    fn handle_restart(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        {
            let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
            controller::restart(&mut session);
        }
        self.send_state(ctx);
    }

    fn send_state(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        send(ctx, &ServerMessage::state(&session));
    }

    /// Run a controller operation that may call the engine on the blocking
    /// pool. The actor waits for it, so one connection handles one event at a
    /// time.
    fn run_turn<F>(&mut self, ctx: &mut ws::WebsocketContext<Self>, op: F)
    where
        F: FnOnce(&mut GameSession, &mut dyn Engine) -> Result<(), SessionError> + Send + 'static,
    {
        let session = self.session.clone();
        let engine = self.app_state.engine.clone();

        let turn = web::block(move || {
            let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
            let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
            let outcome = op(&mut *session, &mut **engine);
            ServerMessage::from_outcome(&session, outcome)
        });

        ctx.wait(turn.into_actor(self).map(|result, act, ctx| match result {
            Ok(msg) => send(ctx, &msg),
            Err(e) => {
                error!("Turn on {} did not complete: {}", act.id, e);
                send(ctx, &ServerMessage::error("Internal server error"));
            }
        }));
    }
}

fn send(ctx: &mut ws::WebsocketContext<ChessWebSocket>, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(text) => ctx.text(text),
        Err(e) => {
            warn!("Failed to serialize response: {}", e);
            ctx.text("{\"message_type\": \"error\", \"error\": \"Internal server error\"}");
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    info!("New WebSocket connection request");
    ws::start(ChessWebSocket::new(app_state), &req, stream)
}
