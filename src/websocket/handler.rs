use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use std::time::Duration;
use uuid::Uuid;

use crate::models::{ChessWebSocketMessage, ClientMessage, ServerMessage};
use crate::state::AppState;

/// WebSocket handler for chess rooms
pub struct ChessWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    /// Room and identity bound by the `join` event.
    pub room_id: Option<String>,
    pub identity: Option<String>,
}

impl ChessWebSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            app_state,
            room_id: None,
            identity: None,
        }
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // Register the actor with the application state
        let total_sessions = self.app_state.register_session(&self.id, ctx.address().recipient());
        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total_sessions);

        let tick = Duration::from_millis(self.app_state.config.clock_tick_ms.max(1));
        ctx.run_interval(tick, |act, _| act.poll_clock());
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        self.leave_room();

        let total_sessions = self.app_state.remove_session(&self.id);
        info!("WebSocket connection closed: {}", self.id);
        info!("Total active sessions: {}", total_sessions);

        Running::Stop
    }
}

impl Handler<ChessWebSocketMessage> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: ChessWebSocketMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
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
                info!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => self.handle_message(client_msg, ctx),
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        ctx.text(ServerMessage::error(format!("Invalid message format: {}", e)).to_json());
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                ctx.text(ServerMessage::error("Binary messages are not supported").to_json());
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
    /// Send `message` to every connection subscribed to the room, optionally
    /// skipping one connection.
    pub fn broadcast_to_room(&self, room_id: &str, message: &ServerMessage, skip: Option<&str>) {
        self.app_state.broadcast(room_id, message, skip);
    }

    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg {
            ClientMessage::Join { room_id, identity, name } => {
                self.handle_join(room_id, identity, name, ctx)
            }
            ClientMessage::Command(command) => self.handle_command(command, ctx),
            ClientMessage::SetName { name } => self.handle_set_name(name, ctx),
            ClientMessage::GetMoves { square } => self.handle_get_moves(square, ctx),
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(req: HttpRequest, stream: web::Payload, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let ws = ChessWebSocket::new(app_state);
    info!("New WebSocket connection: {}", ws.id);
    ws::start(ws, &req, stream)
}
