use actix::Message;
use serde::{Deserialize, Serialize};

use crate::game::{Command, JoinRole, Snapshot};

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    Join {
        room_id: String,
        identity: String,
        #[serde(default)]
        name: Option<String>,
    },
    Command(Command),
    SetName {
        name: String,
    },
    GetMoves {
        #[serde(default)]
        square: Option<String>,
    },
}

/// Message sent from server to client
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined { role: JoinRole, snapshot: Snapshot },
    Snapshot(Snapshot),
    Rejected { command: String, reason: String },
    AvailableMoves { square: Option<String>, moves: Vec<String> },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Serialized frame. Falls back to a generic error frame.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::warn!("Error serializing message: {}", e);
            "{\"event\":\"error\",\"payload\":{\"message\":\"Internal server error\"}}".to_string()
        })
    }
}

/// Message type for WebSocket communication
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);
