use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use log::info;

use crate::game::clock::{now_ms, Millis};
use crate::game::game_state::GameState;
use crate::game::rules::RulesEngine;

/// A live room. Holding the lock is what serializes mutations per room.
pub type Room = Arc<Mutex<GameState>>;

/// Lock a room, recovering the state if a previous holder panicked.
pub fn lock(room: &Room) -> MutexGuard<'_, GameState> {
    room.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Directory of live rooms keyed by room id.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, Room>>,
    rules: Arc<dyn RulesEngine>,
    initial_time_ms: Millis,
}

impl RoomRegistry {
    pub fn new(rules: Arc<dyn RulesEngine>, initial_time_ms: Millis) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            rules,
            initial_time_ms,
        }
    }

    /// Return the room's game, creating it on first access. Concurrent first
    /// accesses for one id all receive the same instance.
    pub fn get_or_create(&self, room_id: &str) -> Room {
        if let Some(room) = self.get(room_id) {
            return room;
        }

        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        // Re-check under the write lock; another caller may have won the race.
        rooms
            .entry(room_id.to_string())
            .or_insert_with(|| {
                info!("room {}: created", room_id);
                Arc::new(Mutex::new(GameState::new(
                    room_id,
                    self.rules.clone(),
                    self.initial_time_ms,
                    now_ms(),
                )))
            })
            .clone()
    }

    pub fn get(&self, room_id: &str) -> Option<Room> {
        let rooms = self.rooms.read().unwrap_or_else(PoisonError::into_inner);
        rooms.get(room_id).cloned()
    }

    /// Tear a room down. Returns whether it existed.
    pub fn remove(&self, room_id: &str) -> bool {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let removed = rooms.remove(room_id).is_some();
        if removed {
            info!("room {}: removed", room_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
