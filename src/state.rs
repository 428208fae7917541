use actix::Recipient;
use log::warn;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::ServerConfig;
use crate::game::{project, GameState, RoomRegistry};
use crate::models::{ChessWebSocketMessage, ServerMessage};

/// Where frames for one connection are delivered.
pub type Session = Recipient<ChessWebSocketMessage>;

/// A connection listening to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub connection_id: String,
    pub identity: String,
}

/// Application state shared between connections
pub struct AppState {
    pub rooms: RoomRegistry,
    pub config: ServerConfig,
    /// Room id to the connections subscribed to it.
    pub connections: Mutex<HashMap<String, Vec<Subscriber>>>,
    /// Connection id to the actor serving it.
    pub sessions: Mutex<HashMap<String, Session>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AppState {
    pub fn new(rooms: RoomRegistry, config: ServerConfig) -> Self {
        Self {
            rooms,
            config,
            connections: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn register_session(&self, connection_id: &str, session: Session) -> usize {
        let mut sessions = guard(&self.sessions);
        sessions.insert(connection_id.to_string(), session);
        sessions.len()
    }

    pub fn remove_session(&self, connection_id: &str) -> usize {
        let mut sessions = guard(&self.sessions);
        sessions.remove(connection_id);
        sessions.len()
    }

    pub fn subscribe(&self, room_id: &str, subscriber: Subscriber) {
        let mut connections = guard(&self.connections);
        let subscribers = connections.entry(room_id.to_string()).or_default();
        if !subscribers.contains(&subscriber) {
            subscribers.push(subscriber);
        }
    }

    /// Drop a connection from a room. Returns whether another connection of
    /// the same identity is still subscribed.
    pub fn unsubscribe(&self, room_id: &str, connection_id: &str, identity: &str) -> bool {
        let mut connections = guard(&self.connections);
        let Some(subscribers) = connections.get_mut(room_id) else {
            return false;
        };
        subscribers.retain(|s| s.connection_id != connection_id);
        let still_present = subscribers.iter().any(|s| s.identity == identity);
        if subscribers.is_empty() {
            connections.remove(room_id);
        }
        still_present
    }

    /// Sessions of every connection subscribed to `room_id`.
    pub fn subscribers(&self, room_id: &str) -> Vec<(String, Session)> {
        // Scope the locks to minimize lock time
        let connection_ids: Vec<String> = match guard(&self.connections).get(room_id) {
            Some(subscribers) => subscribers.iter().map(|s| s.connection_id.clone()).collect(),
            None => return Vec::new(),
        };
        let sessions = guard(&self.sessions);
        connection_ids
            .into_iter()
            .filter_map(|id| sessions.get(&id).cloned().map(|session| (id, session)))
            .collect()
    }

    pub fn subscriber_count(&self, room_id: &str) -> usize {
        guard(&self.connections).get(room_id).map_or(0, Vec::len)
    }

    /// Send `message` to every connection subscribed to the room, optionally
    /// skipping one connection. Returns how many connections were sent to.
    pub fn broadcast(&self, room_id: &str, message: &ServerMessage, skip: Option<&str>) -> usize {
        let subscribers = self.subscribers(room_id);
        if subscribers.is_empty() {
            warn!("No connections found for room {}", room_id);
            return 0;
        }

        // Serialize the message once
        let message_str = message.to_json();
        let mut sent = 0;
        for (connection_id, session) in subscribers {
            if skip == Some(connection_id.as_str()) {
                continue;
            }
            session.do_send(ChessWebSocketMessage(message_str.clone()));
            sent += 1;
        }
        sent
    }

    /// Project `game` and send the snapshot to the whole room. Callers pass
    /// the game while still holding its room lock, so snapshots reach every
    /// connection in the order the changes were applied.
    pub fn publish_snapshot(&self, room_id: &str, game: &GameState) -> usize {
        self.broadcast(room_id, &ServerMessage::Snapshot(project(game)), None)
    }

    /// Forget every subscription to `room_id`, telling each listening
    /// connection that the room is gone.
    pub fn close_room(&self, room_id: &str) -> usize {
        let Some(subscribers) = guard(&self.connections).remove(room_id) else {
            return 0;
        };
        let notice = ServerMessage::error(format!("Room {} was closed", room_id)).to_json();
        let sessions = guard(&self.sessions);
        let mut notified = 0;
        for subscriber in &subscribers {
            if let Some(session) = sessions.get(&subscriber.connection_id) {
                session.do_send(ChessWebSocketMessage(notice.clone()));
                notified += 1;
            }
        }
        notified
    }
}
