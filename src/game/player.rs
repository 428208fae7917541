use chess::Color;
use serde::Serialize;

use crate::game::clock::Millis;

/// One of the two binding slots of a match. Seats keep their identity across
/// rematches; only the colour they play may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub const ALL: [Seat; 2] = [Seat::First, Seat::Second];

    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }

    /// The colour a seat plays before any rematch swaps them.
    pub fn initial_color(self) -> Color {
        match self {
            Seat::First => Color::White,
            Seat::Second => Color::Black,
        }
    }
}

/// Outstanding proposals awaiting the opponent's answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Offers {
    pub draw: bool,
    pub takeback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub identity: String,
    pub display_name: Option<String>,
    pub color: Color,
    pub remaining_time_ms: Millis,
    pub is_connected: bool,
    pub offers: Offers,
    pub win_count: u32,
}

impl Player {
    pub fn new(identity: &str, color: Color, initial_time_ms: Millis) -> Self {
        Self {
            identity: identity.to_string(),
            display_name: None,
            color,
            remaining_time_ms: initial_time_ms,
            is_connected: true,
            offers: Offers::default(),
            win_count: 0,
        }
    }

    pub fn clear_offers(&mut self) {
        self.offers = Offers::default();
    }
}

/// The two seats of a room, addressable by seat, identity or colour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Seats([Option<Player>; 2]);

impl Seats {
    pub fn get(&self, seat: Seat) -> Option<&Player> {
        self.0[seat.index()].as_ref()
    }

    pub fn get_mut(&mut self, seat: Seat) -> Option<&mut Player> {
        self.0[seat.index()].as_mut()
    }

    pub fn bind(&mut self, seat: Seat, player: Player) {
        self.0[seat.index()] = Some(player);
    }

    pub fn first_empty(&self) -> Option<Seat> {
        Seat::ALL.into_iter().find(|seat| self.get(*seat).is_none())
    }

    pub fn is_full(&self) -> bool {
        self.first_empty().is_none()
    }

    pub fn seat_of(&self, identity: &str) -> Option<Seat> {
        Seat::ALL
            .into_iter()
            .find(|seat| self.get(*seat).map_or(false, |p| p.identity == identity))
    }

    pub fn seat_by_color(&self, color: Color) -> Option<Seat> {
        Seat::ALL
            .into_iter()
            .find(|seat| self.get(*seat).map_or(false, |p| p.color == color))
    }

    pub fn players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.0.iter_mut().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_fill_in_fixed_order() {
        let mut seats = Seats::default();
        assert_eq!(seats.first_empty(), Some(Seat::First));
        seats.bind(Seat::First, Player::new("a", Color::White, 0));
        assert_eq!(seats.first_empty(), Some(Seat::Second));
        seats.bind(Seat::Second, Player::new("b", Color::Black, 0));
        assert!(seats.is_full());

        assert_eq!(seats.seat_of("b"), Some(Seat::Second));
        assert_eq!(seats.seat_of("c"), None);
        assert_eq!(seats.seat_by_color(Color::White), Some(Seat::First));
    }

    #[test]
    fn clearing_offers_resets_both_flags() {
        let mut player = Player::new("a", Color::White, 0);
        player.offers.draw = true;
        player.offers.takeback = true;
        player.clear_offers();
        assert_eq!(player.offers, Offers::default());
    }
}
