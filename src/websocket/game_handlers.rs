use actix_web_actors::ws;
use log::{debug, info, warn};

use crate::game::clock::now_ms;
use crate::game::registry::lock;
use crate::game::{dispatch, project, Command, Rejection, Room};
use crate::models::ServerMessage;
use crate::state::Subscriber;
use crate::websocket::handler::ChessWebSocket;

impl ChessWebSocket {
    /// The room and identity this connection joined with.
    fn session(&self) -> Option<(String, String)> {
        self.room_id.clone().zip(self.identity.clone())
    }

    /// The live room this connection follows. A room torn down underneath
    /// the connection ends its session.
    fn current_room(&mut self, ctx: &mut ws::WebsocketContext<Self>) -> Option<(Room, String, String)> {
        let Some((room_id, identity)) = self.session() else {
            ctx.text(ServerMessage::error("Not in a game").to_json());
            return None;
        };
        match self.app_state.rooms.get(&room_id) {
            Some(room) => Some((room, room_id, identity)),
            None => {
                self.room_id = None;
                self.identity = None;
                ctx.text(ServerMessage::error(format!("Room {} was closed", room_id)).to_json());
                None
            }
        }
    }

    fn reject(&self, command: &str, rejection: Rejection, ctx: &mut ws::WebsocketContext<Self>) {
        debug!("{}: {} rejected: {}", self.id, command, rejection);
        let message = ServerMessage::Rejected {
            command: command.to_string(),
            reason: rejection.to_string(),
        };
        ctx.text(message.to_json());
    }

    pub fn handle_join(
        &mut self,
        room_id: String,
        identity: String,
        name: Option<String>,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        info!("{} joining room {} as {}", self.id, room_id, identity);

        // A connection follows one room at a time.
        if self.room_id.as_deref() != Some(room_id.as_str()) || self.identity.as_deref() != Some(identity.as_str()) {
            self.leave_room();
        }

        let room = self.app_state.rooms.get_or_create(&room_id);
        let mut game = lock(&room);
        let role = game.join(&identity);
        if let Some(name) = &name {
            if let Err(rejection) = game.set_display_name(&identity, name) {
                debug!("{}: name ignored: {}", self.id, rejection);
            }
        }

        self.app_state.subscribe(
            &room_id,
            Subscriber {
                connection_id: self.id.clone(),
                identity: identity.clone(),
            },
        );
        self.room_id = Some(room_id.clone());
        self.identity = Some(identity);

        // Broadcast before releasing the room so snapshots go out in order.
        let snapshot = project(&game);
        ctx.text(ServerMessage::Joined { role, snapshot: snapshot.clone() }.to_json());
        self.broadcast_to_room(&room_id, &ServerMessage::Snapshot(snapshot), Some(self.id.as_str()));
    }

    pub fn handle_command(&mut self, command: Command, ctx: &mut ws::WebsocketContext<Self>) {
        if self.session().is_none() {
            warn!("{}: {} before joining a room", self.id, command.name());
        }
        let Some((room, room_id, identity)) = self.current_room(ctx) else {
            return;
        };

        let mut game = lock(&room);
        match dispatch(&mut game, &identity, &command, now_ms()) {
            Ok(()) => {
                self.app_state.publish_snapshot(&room_id, &game);
            }
            Err(rejection) => self.reject(command.name(), rejection, ctx),
        }
    }

    pub fn handle_set_name(&mut self, name: String, ctx: &mut ws::WebsocketContext<Self>) {
        let Some((room, room_id, identity)) = self.current_room(ctx) else {
            return;
        };

        let mut game = lock(&room);
        match game.set_display_name(&identity, &name) {
            Ok(()) => {
                self.app_state.publish_snapshot(&room_id, &game);
            }
            Err(rejection) => self.reject("set_name", rejection, ctx),
        }
    }

    pub fn handle_get_moves(&mut self, square: Option<String>, ctx: &mut ws::WebsocketContext<Self>) {
        let Some((room, _, _)) = self.current_room(ctx) else {
            return;
        };

        let moves = lock(&room).legal_moves(square.as_deref());
        match moves {
            Ok(moves) => ctx.text(ServerMessage::AvailableMoves { square, moves }.to_json()),
            Err(rejection) => self.reject("get_moves", rejection, ctx),
        }
    }

    /// File the timeout claim for whoever is to move once their clock has
    /// run out. Every connection in the room polls, so a player who dropped
    /// off still loses on time.
    pub fn poll_clock(&mut self) {
        let Some(room_id) = self.room_id.clone() else {
            return;
        };
        let Some(room) = self.app_state.rooms.get(&room_id) else {
            return;
        };

        let mut game = lock(&room);
        if game.claim_expired_clock(now_ms()) {
            info!("room {}: flag fell for {:?}", room_id, game.side_to_move());
            self.app_state.publish_snapshot(&room_id, &game);
        }
    }

    /// Unsubscribe from the current room, marking the player offline when
    /// this was their last connection to it.
    pub fn leave_room(&mut self) {
        let Some((room_id, identity)) = self.session() else {
            return;
        };
        self.room_id = None;
        self.identity = None;

        let still_connected = self.app_state.unsubscribe(&room_id, &self.id, &identity);
        info!("Removed {} ({}) from room {}'s connections", self.id, identity, room_id);
        if still_connected {
            return;
        }

        // Rooms outlive their connections; the seat is kept for a reconnect.
        let Some(room) = self.app_state.rooms.get(&room_id) else {
            return;
        };
        let mut game = lock(&room);
        game.disconnect(&identity);
        if self.app_state.subscriber_count(&room_id) > 0 {
            self.app_state.publish_snapshot(&room_id, &game);
        }
    }
}
