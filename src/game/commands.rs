use serde::{Deserialize, Serialize};

use crate::game::clock::Millis;
use crate::game::error::Rejection;
use crate::game::game_state::GameState;
use crate::game::rules::MoveRequest;

/// Colour requested by whoever starts a new game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideChoice {
    White,
    Black,
    /// Swap the colours of the previous game.
    Random,
}

/// A state-changing request from a seated participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    StartNewGame {
        #[serde(default)]
        time: Option<u32>,
        side: SideChoice,
    },
    MakeMove {
        #[serde(rename = "move")]
        mv: MoveRequest,
    },
    TimeIsOut,
    #[serde(rename = "give_15_seconds")]
    Give15Seconds,
    ProposeTakeback,
    CancelTakebackOffer,
    AcceptTakeback,
    DeclineTakeback,
    OfferDraw,
    CancelDrawOffer,
    AcceptDraw,
    DeclineDraw,
    Resign,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::StartNewGame { .. } => "start_new_game",
            Command::MakeMove { .. } => "make_move",
            Command::TimeIsOut => "time_is_out",
            Command::Give15Seconds => "give_15_seconds",
            Command::ProposeTakeback => "propose_takeback",
            Command::CancelTakebackOffer => "cancel_takeback_offer",
            Command::AcceptTakeback => "accept_takeback",
            Command::DeclineTakeback => "decline_takeback",
            Command::OfferDraw => "offer_draw",
            Command::CancelDrawOffer => "cancel_draw_offer",
            Command::AcceptDraw => "accept_draw",
            Command::DeclineDraw => "decline_draw",
            Command::Resign => "resign",
        }
    }
}

/// Apply `command` on behalf of `identity`. `Ok` means the game changed and a
/// fresh snapshot should be broadcast.
pub fn dispatch(game: &mut GameState, identity: &str, command: &Command, now: Millis) -> Result<(), Rejection> {
    match command {
        Command::StartNewGame { time, side } => game.start_new_game(identity, *side, *time, now),
        Command::MakeMove { mv } => game.apply_move(identity, mv, now),
        Command::TimeIsOut => game.timeout(identity, now).map(|_| ()),
        Command::Give15Seconds => game.give_15_seconds(identity),
        Command::ProposeTakeback => game.offer_takeback(identity),
        Command::CancelTakebackOffer => game.cancel_takeback_offer(identity),
        Command::AcceptTakeback => game.accept_takeback(identity),
        Command::DeclineTakeback => game.decline_takeback(identity),
        Command::OfferDraw => game.offer_draw(identity),
        Command::CancelDrawOffer => game.cancel_draw_offer(identity),
        Command::AcceptDraw => game.accept_draw(identity),
        Command::DeclineDraw => game.decline_draw(identity),
        Command::Resign => game.resign(identity),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::game::game_state::Outcome;
    use crate::game::player::Seat;
    use crate::game::rules::ChessRules;

    fn parse(json: &str) -> Command {
        serde_json::from_str(json).expect("valid command")
    }

    #[test]
    fn parses_wire_commands() {
        assert_eq!(
            parse(r#"{"type":"start_new_game","time":5,"side":"random"}"#),
            Command::StartNewGame { time: Some(5), side: SideChoice::Random }
        );
        assert_eq!(
            parse(r#"{"type":"start_new_game","side":"white"}"#),
            Command::StartNewGame { time: None, side: SideChoice::White }
        );
        assert_eq!(
            parse(r#"{"type":"make_move","move":{"from":"e7","to":"e8","promotion":"q"}}"#),
            Command::MakeMove { mv: MoveRequest::promoting("e7", "e8", "q") }
        );
        assert_eq!(parse(r#"{"type":"give_15_seconds"}"#), Command::Give15Seconds);
        assert_eq!(parse(r#"{"type":"time_is_out"}"#), Command::TimeIsOut);
        assert_eq!(parse(r#"{"type":"cancel_takeback_offer"}"#), Command::CancelTakebackOffer);
        assert!(serde_json::from_str::<Command>(r#"{"type":"castle_queenside"}"#).is_err());
    }

    #[test]
    fn names_match_wire_tags() {
        for command in [
            Command::Give15Seconds,
            Command::ProposeTakeback,
            Command::DeclineDraw,
            Command::StartNewGame { time: None, side: SideChoice::Black },
        ] {
            let json = serde_json::to_value(&command).expect("serializable");
            assert_eq!(json["type"], command.name());
        }
    }

    #[test]
    fn dispatch_routes_to_the_game() {
        let mut game = GameState::new("room", Arc::new(ChessRules), 600_000, 1);
        game.join("a");
        game.join("b");

        dispatch(&mut game, "a", &Command::OfferDraw, 1).unwrap();
        assert_eq!(
            dispatch(&mut game, "a", &Command::AcceptDraw, 1),
            Err(Rejection::NoPendingOffer)
        );
        dispatch(&mut game, "b", &Command::AcceptDraw, 1).unwrap();
        assert_eq!(game.outcome(), Some(Outcome::DrawAgreed));

        let restart = Command::StartNewGame { time: Some(1), side: SideChoice::White };
        dispatch(&mut game, "b", &restart, 2).unwrap();
        assert_eq!(game.player(Seat::Second).map(|p| p.remaining_time_ms), Some(60_000));

        let opening = Command::MakeMove { mv: MoveRequest::new("e2", "e4") };
        dispatch(&mut game, "b", &opening, 3).unwrap();
        assert_eq!(game.move_log().len(), 1);
        assert_eq!(
            dispatch(&mut game, "a", &Command::TimeIsOut, 4),
            Err(Rejection::ClockNotRunning)
        );
    }
}
