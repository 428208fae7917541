use serde::Serialize;

use crate::game::clock::Millis;
use crate::game::game_state::{GameState, Outcome};
use crate::game::player::{Offers, Player, Seat};
use crate::game::rules::MoveRecord;
use crate::game::utils::color_to_string;

/// Public view of a seated player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSnapshot {
    pub identity: String,
    pub name: Option<String>,
    pub color: String,
    pub time_left_ms: Millis,
    pub online: bool,
    pub offers: Offers,
    pub wins: u32,
}

impl From<&Player> for PlayerSnapshot {
    fn from(player: &Player) -> Self {
        Self {
            identity: player.identity.clone(),
            name: player.display_name.clone(),
            color: color_to_string(player.color),
            time_left_ms: player.remaining_time_ms,
            online: player.is_connected,
            offers: player.offers,
            wins: player.win_count,
        }
    }
}

/// Owned, externally safe copy of a room's state, broadcast to every client
/// of the room. Building one never touches the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub room_id: String,
    /// Indexed by seat: first, then second. `None` for an empty seat.
    pub players: [Option<PlayerSnapshot>; 2],
    pub observers: Vec<String>,
    pub fen: String,
    pub turn: String,
    pub is_timed: bool,
    pub total_time_ms: Millis,
    pub game_start_time: Millis,
    pub last_turn_start_time: Millis,
    pub created_at: Millis,
    pub is_over: bool,
    pub outcome: Option<Outcome>,
    pub winner: Option<String>,
    pub moves: Vec<MoveRecord>,
}

impl Snapshot {
    pub fn player(&self, seat: Seat) -> Option<&PlayerSnapshot> {
        self.players[seat.index()].as_ref()
    }
}

pub fn project(game: &GameState) -> Snapshot {
    let seat_view = |seat: Seat| game.player(seat).map(PlayerSnapshot::from);
    let outcome = game.outcome();
    let clock = game.clock();

    Snapshot {
        room_id: game.room_id().to_string(),
        players: [seat_view(Seat::First), seat_view(Seat::Second)],
        observers: game.observers().to_vec(),
        fen: game.position().fen(),
        turn: color_to_string(game.side_to_move()),
        is_timed: clock.is_timed,
        total_time_ms: clock.total_time_ms,
        game_start_time: clock.match_started_at,
        last_turn_start_time: clock.last_turn_started_at,
        created_at: game.created_at(),
        is_over: game.is_over(),
        outcome,
        winner: outcome
            .and_then(|o| o.winner())
            .and_then(|seat| game.player(seat))
            .map(|p| color_to_string(p.color)),
        moves: game.move_log().to_vec(),
    }
}
