use std::sync::Arc;

use chess::Color;
use log::{debug, info};
use serde::Serialize;

use crate::game::clock::{Clock, Millis};
use crate::game::commands::SideChoice;
use crate::game::error::Rejection;
use crate::game::player::{Player, Seat, Seats};
use crate::game::rules::{DrawRule, MoveRecord, MoveRequest, Position, RulesEngine, Terminal};

/// Courtesy time granted to the opponent by `give_15_seconds`.
pub const COURTESY_TIME_MS: Millis = 15 * 1000;

/// How a concluded game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Checkmate { winner: Seat },
    Resignation { winner: Seat },
    Timeout { winner: Seat },
    DrawAgreed,
    DrawByRule { rule: DrawRule },
}

impl Outcome {
    pub fn winner(&self) -> Option<Seat> {
        match *self {
            Outcome::Checkmate { winner }
            | Outcome::Resignation { winner }
            | Outcome::Timeout { winner } => Some(winner),
            Outcome::DrawAgreed | Outcome::DrawByRule { .. } => None,
        }
    }

    /// Conclusions produced by the last move itself, which a takeback undoes.
    fn is_decided_by_last_move(&self) -> bool {
        matches!(self, Outcome::Checkmate { .. } | Outcome::DrawByRule { .. })
    }
}

/// What a participant became by joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "role", content = "seat", rename_all = "snake_case")]
pub enum JoinRole {
    Seated(Seat),
    Observer,
}

/// The authoritative state of one room's match.
///
/// Every mutating operation either applies completely and returns `Ok`, or
/// returns a [`Rejection`] and leaves the state untouched.
pub struct GameState {
    room_id: String,
    rules: Arc<dyn RulesEngine>,
    initial_time_ms: Millis,
    created_at: Millis,
    position: Position,
    seats: Seats,
    observers: Vec<String>,
    clock: Clock,
    outcome: Option<Outcome>,
    move_log: Vec<MoveRecord>,
    win_credited: bool,
}

impl GameState {
    pub fn new(room_id: &str, rules: Arc<dyn RulesEngine>, initial_time_ms: Millis, now: Millis) -> Self {
        Self {
            room_id: room_id.to_string(),
            position: rules.initial_position(),
            rules,
            initial_time_ms,
            created_at: now,
            seats: Seats::default(),
            observers: Vec::new(),
            clock: Clock::untimed(),
            outcome: None,
            move_log: Vec::new(),
            win_credited: false,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn created_at(&self) -> Millis {
        self.created_at
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn seats(&self) -> &Seats {
        &self.seats
    }

    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.seats.get(seat)
    }

    pub fn seat_of(&self, identity: &str) -> Option<Seat> {
        self.seats.seat_of(identity)
    }

    pub fn observers(&self) -> &[String] {
        &self.observers
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn move_log(&self) -> &[MoveRecord] {
        &self.move_log
    }

    pub fn side_to_move(&self) -> Color {
        self.position.side_to_move()
    }

    pub fn is_turn_of(&self, identity: &str) -> bool {
        self.seat_of(identity)
            .and_then(|seat| self.seats.get(seat))
            .map_or(false, |p| p.color == self.side_to_move())
    }

    /// Whether the side to move would be out of time at `now`.
    pub fn time_expired(&self, now: Millis) -> bool {
        if self.is_over() || !self.clock.is_running() {
            return false;
        }
        self.seats
            .seat_by_color(self.side_to_move())
            .and_then(|seat| self.seats.get(seat))
            .map_or(false, |p| self.clock.projected_remaining(p.remaining_time_ms, now) == 0)
    }

    pub fn legal_moves(&self, from: Option<&str>) -> Result<Vec<String>, Rejection> {
        self.rules.legal_moves(&self.position, from)
    }

    // ---- seats and sessions ----

    pub fn join(&mut self, identity: &str) -> JoinRole {
        if let Some(seat) = self.seat_of(identity) {
            if let Some(player) = self.seats.get_mut(seat) {
                player.is_connected = true;
            }
            return JoinRole::Seated(seat);
        }

        if let Some(seat) = self.seats.first_empty() {
            let color = match self.seats.get(seat.other()) {
                Some(other) => !other.color,
                None => seat.initial_color(),
            };
            self.seats.bind(seat, Player::new(identity, color, self.initial_time_ms));
            info!("room {}: {} takes the {:?} seat", self.room_id, identity, seat);
            return JoinRole::Seated(seat);
        }

        if !self.observers.iter().any(|o| o == identity) {
            self.observers.push(identity.to_string());
        }
        JoinRole::Observer
    }

    pub fn disconnect(&mut self, identity: &str) {
        match self.seat_of(identity).and_then(|seat| self.seats.get_mut(seat)) {
            Some(player) => player.is_connected = false,
            None => self.observers.retain(|o| o != identity),
        }
    }

    pub fn set_display_name(&mut self, identity: &str, name: &str) -> Result<(), Rejection> {
        let player = self.seated_player_mut(identity)?;
        player.display_name = Some(name.to_string());
        Ok(())
    }

    // ---- moves and time ----

    pub fn apply_move(&mut self, identity: &str, request: &MoveRequest, now: Millis) -> Result<(), Rejection> {
        if self.is_over() {
            return Err(Rejection::GameOver);
        }
        let seat = self.seat_of(identity).ok_or(Rejection::NotSeated)?;
        if !self.is_turn_of(identity) {
            return Err(Rejection::NotYourTurn);
        }

        let applied = self.rules.apply_move(&self.position, request)?;
        debug!("room {}: {} plays {}", self.room_id, identity, applied.record.uci);
        self.position = applied.position;
        self.move_log.push(applied.record);

        let out_of_time = self.account_move_time(seat, now);
        if !self.evaluate_rules() && out_of_time {
            self.conclude(Outcome::Timeout { winner: seat.other() });
        }
        Ok(())
    }

    /// The clock starts on the second ply; every later ply is charged to
    /// its mover. Returns true when the mover ran out of time.
    fn account_move_time(&mut self, mover: Seat, now: Millis) -> bool {
        if !self.clock.is_timed {
            return false;
        }
        match self.move_log.len() {
            0 | 1 => false,
            2 => {
                self.clock.start(now);
                false
            }
            _ => match self.seats.get_mut(mover) {
                Some(player) => self.clock.charge(&mut player.remaining_time_ms, now),
                None => false,
            },
        }
    }

    /// Conclude the game if the current position ends it by rule. Safe to
    /// call repeatedly; returns whether the game is over afterwards.
    pub fn evaluate_rules(&mut self) -> bool {
        if self.is_over() {
            return true;
        }
        let outcome = match self.rules.terminal_state(&self.position) {
            Some(Terminal::Checkmate) => {
                // The mated side is to move.
                match self.seats.seat_by_color(!self.side_to_move()) {
                    Some(winner) => Outcome::Checkmate { winner },
                    None => return false,
                }
            }
            Some(Terminal::Draw(rule)) => Outcome::DrawByRule { rule },
            None => return false,
        };
        self.conclude(outcome);
        true
    }

    /// Self-reported flag fall: the side to move asks for its own clock to be
    /// charged. Returns whether the game concluded.
    pub fn timeout(&mut self, identity: &str, now: Millis) -> Result<bool, Rejection> {
        if !self.clock.is_timed {
            return Err(Rejection::NotTimed);
        }
        if self.is_over() {
            return Err(Rejection::GameOver);
        }
        let seat = self.seat_of(identity).ok_or(Rejection::NotSeated)?;
        if !self.is_turn_of(identity) {
            return Err(Rejection::NotYourTurn);
        }
        if !self.clock.is_running() {
            return Err(Rejection::ClockNotRunning);
        }

        let out_of_time = match self.seats.get_mut(seat) {
            Some(player) => self.clock.charge(&mut player.remaining_time_ms, now),
            None => false,
        };
        if out_of_time {
            self.conclude(Outcome::Timeout { winner: seat.other() });
        }
        Ok(out_of_time)
    }

    /// Raise the timeout claim for the side to move once its clock has run
    /// out, whoever is polling. Returns whether the game concluded.
    pub fn claim_expired_clock(&mut self, now: Millis) -> bool {
        if !self.time_expired(now) {
            return false;
        }
        let mover = self
            .seats
            .seat_by_color(self.side_to_move())
            .and_then(|seat| self.seats.get(seat))
            .map(|player| player.identity.clone());
        match mover {
            Some(identity) => matches!(self.timeout(&identity, now), Ok(true)),
            None => false,
        }
    }

    pub fn give_15_seconds(&mut self, identity: &str) -> Result<(), Rejection> {
        if !self.clock.is_timed {
            return Err(Rejection::NotTimed);
        }
        if self.is_over() {
            return Err(Rejection::GameOver);
        }
        let seat = self.seat_of(identity).ok_or(Rejection::NotSeated)?;
        let opponent = self.seats.get_mut(seat.other()).ok_or(Rejection::SeatsNotFilled)?;
        opponent.remaining_time_ms += COURTESY_TIME_MS;
        Ok(())
    }

    // ---- resignation and draws ----

    pub fn resign(&mut self, identity: &str) -> Result<(), Rejection> {
        if self.is_over() {
            return Err(Rejection::GameOver);
        }
        let seat = self.seat_of(identity).ok_or(Rejection::NotSeated)?;
        self.conclude(Outcome::Resignation { winner: seat.other() });
        Ok(())
    }

    pub fn offer_draw(&mut self, identity: &str) -> Result<(), Rejection> {
        self.open_player_mut(identity)?.offers.draw = true;
        Ok(())
    }

    pub fn cancel_draw_offer(&mut self, identity: &str) -> Result<(), Rejection> {
        self.seated_player_mut(identity)?.offers.draw = false;
        Ok(())
    }

    /// Accept the draw the opponent offered. Offering and accepting your own
    /// draw is not possible.
    pub fn accept_draw(&mut self, identity: &str) -> Result<(), Rejection> {
        if self.is_over() {
            return Err(Rejection::GameOver);
        }
        let opponent = self.opponent(identity)?;
        if !opponent.offers.draw {
            return Err(Rejection::NoPendingOffer);
        }
        self.clear_offers();
        self.conclude(Outcome::DrawAgreed);
        Ok(())
    }

    pub fn decline_draw(&mut self, identity: &str) -> Result<(), Rejection> {
        self.opponent_mut(identity)?.offers.draw = false;
        Ok(())
    }

    // ---- takebacks ----

    pub fn offer_takeback(&mut self, identity: &str) -> Result<(), Rejection> {
        self.ensure_takebackable()?;
        self.seated_player_mut(identity)?.offers.takeback = true;
        Ok(())
    }

    pub fn cancel_takeback_offer(&mut self, identity: &str) -> Result<(), Rejection> {
        self.seated_player_mut(identity)?.offers.takeback = false;
        Ok(())
    }

    /// Undo the last ply at the opponent's request. A game concluded by that
    /// very ply (mate or a drawing rule) is reopened.
    pub fn accept_takeback(&mut self, identity: &str) -> Result<(), Rejection> {
        self.ensure_takebackable()?;
        if !self.opponent(identity)?.offers.takeback {
            return Err(Rejection::NoPendingOffer);
        }
        let (_, kept) = self.move_log.split_last().ok_or(Rejection::NothingToTakeBack)?;

        let position = self.replay(kept)?;
        self.position = position;
        self.move_log.pop();
        if self.move_log.len() < 2 {
            // Both sides must move again before time is charged.
            self.clock.stop();
        }
        for player in self.seats.players_mut() {
            player.offers.takeback = false;
        }
        if self.outcome.take().is_some() {
            info!("room {}: game reopened by takeback", self.room_id);
        }
        Ok(())
    }

    pub fn decline_takeback(&mut self, identity: &str) -> Result<(), Rejection> {
        self.opponent_mut(identity)?.offers.takeback = false;
        Ok(())
    }

    fn ensure_takebackable(&self) -> Result<(), Rejection> {
        match self.outcome {
            Some(outcome) if !outcome.is_decided_by_last_move() => Err(Rejection::NotTakebackable),
            _ => Ok(()),
        }
    }

    fn replay(&self, moves: &[MoveRecord]) -> Result<Position, Rejection> {
        moves.iter().try_fold(self.rules.initial_position(), |position, record| {
            self.rules
                .apply_move(&position, &record.request())
                .map(|applied| applied.position)
        })
    }

    // ---- rematch ----

    /// Reset the board for a new game between the same two seats. Seats, win
    /// counts and connection state carry over.
    pub fn start_new_game(
        &mut self,
        identity: &str,
        side: SideChoice,
        time_control_minutes: Option<u32>,
        now: Millis,
    ) -> Result<(), Rejection> {
        if !self.seats.is_full() {
            return Err(Rejection::SeatsNotFilled);
        }
        let requester = self.seat_of(identity).ok_or(Rejection::NotSeated)?;
        let requester_color = match side {
            SideChoice::White => Color::White,
            SideChoice::Black => Color::Black,
            SideChoice::Random => match self.seats.get(requester.other()) {
                Some(other) => other.color,
                None => return Err(Rejection::SeatsNotFilled),
            },
        };

        self.clock = match time_control_minutes {
            Some(minutes) if minutes > 0 => Clock::timed(minutes),
            _ => Clock::untimed(),
        };
        let budget = self.clock.total_time_ms;
        for seat in Seat::ALL {
            if let Some(player) = self.seats.get_mut(seat) {
                player.color = if seat == requester { requester_color } else { !requester_color };
                player.clear_offers();
                if budget > 0 {
                    player.remaining_time_ms = budget;
                }
            }
        }

        self.position = self.rules.initial_position();
        self.move_log.clear();
        self.outcome = None;
        self.win_credited = false;
        self.created_at = now;
        info!(
            "room {}: new game, {} plays {:?}, timed: {}",
            self.room_id, identity, requester_color, self.clock.is_timed
        );
        Ok(())
    }

    // ---- internals ----

    fn conclude(&mut self, outcome: Outcome) {
        if self.outcome.is_some() {
            return;
        }
        info!("room {}: game over, {:?}", self.room_id, outcome);
        self.outcome = Some(outcome);
        self.credit_win();
    }

    fn credit_win(&mut self) {
        if self.win_credited {
            return;
        }
        let Some(winner) = self.outcome.and_then(|o| o.winner()) else {
            return;
        };
        if let Some(player) = self.seats.get_mut(winner) {
            player.win_count += 1;
            self.win_credited = true;
        }
    }

    fn clear_offers(&mut self) {
        for player in self.seats.players_mut() {
            player.clear_offers();
        }
    }

    fn seated_player_mut(&mut self, identity: &str) -> Result<&mut Player, Rejection> {
        let seat = self.seat_of(identity).ok_or(Rejection::NotSeated)?;
        self.seats.get_mut(seat).ok_or(Rejection::NotSeated)
    }

    /// A seated player who may still offer a draw.
    fn open_player_mut(&mut self, identity: &str) -> Result<&mut Player, Rejection> {
        if self.is_over() {
            return Err(Rejection::GameOver);
        }
        self.seated_player_mut(identity)
    }

    fn opponent(&self, identity: &str) -> Result<&Player, Rejection> {
        let seat = self.seat_of(identity).ok_or(Rejection::NotSeated)?;
        self.seats.get(seat.other()).ok_or(Rejection::SeatsNotFilled)
    }

    fn opponent_mut(&mut self, identity: &str) -> Result<&mut Player, Rejection> {
        let seat = self.seat_of(identity).ok_or(Rejection::NotSeated)?;
        self.seats.get_mut(seat.other()).ok_or(Rejection::SeatsNotFilled)
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self, seat: Seat) -> Option<&mut Player> {
        self.seats.get_mut(seat)
    }

    #[cfg(test)]
    pub(crate) fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }
}
