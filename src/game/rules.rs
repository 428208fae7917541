//! Chess rules oracle.
//!
//! `GameState` never interprets chess itself: it asks a [`RulesEngine`] whether
//! a move is legal, what position results, and whether that position ends the
//! game. [`ChessRules`] is the implementation backed by the `chess` crate.

use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square};
use serde::{Deserialize, Serialize};

use crate::game::error::Rejection;
use crate::game::utils::{color_name, has_insufficient_material, parse_promotion, piece_name};

/// Halfmoves without a capture or pawn move after which the game is drawn.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// A move as sent by a client: squares in algebraic notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
}

impl MoveRequest {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            promotion: None,
        }
    }

    pub fn promoting(from: &str, to: &str, promotion: &str) -> Self {
        Self {
            promotion: Some(promotion.to_string()),
            ..Self::new(from, to)
        }
    }
}

/// One entry of a game's move log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<String>,
    pub color: &'static str,
    pub piece: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured: Option<&'static str>,
    pub uci: String,
}

impl MoveRecord {
    /// The request that replays this move.
    pub fn request(&self) -> MoveRequest {
        MoveRequest {
            from: self.from.clone(),
            to: self.to.clone(),
            promotion: self.promotion.clone(),
        }
    }
}

/// Ways a game can be drawn by rule rather than by agreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawRule {
    Stalemate,
    InsufficientMaterial,
    FiftyMoves,
    ThreefoldRepetition,
}

/// A position that ends the game on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// The side to move has been mated; the other side won.
    Checkmate,
    Draw(DrawRule),
}

/// A board together with the history the draw rules depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: Board,
    halfmove_clock: u32,
    fullmove_number: u32,
    history: Vec<u64>,
}

impl Default for Position {
    fn default() -> Self {
        Self::from_board(Board::default())
    }
}

impl Position {
    /// A fresh game starting from `board`.
    pub fn from_board(board: Board) -> Self {
        Self {
            history: vec![board.get_hash()],
            board,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// How many times the current position has occurred, this one included.
    pub fn repetitions(&self) -> usize {
        let current = self.board.get_hash();
        self.history.iter().filter(|hash| **hash == current).count()
    }

    /// FEN with the real halfmove clock and fullmove number.
    pub fn fen(&self) -> String {
        let board_fen = self.board.to_string();
        let fields: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            fields.join(" "),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    fn after(&self, chess_move: ChessMove) -> Position {
        let resets_clock = self.board.piece_on(chess_move.get_source()) == Some(Piece::Pawn)
            || self.board.piece_on(chess_move.get_dest()).is_some();
        let board = self.board.make_move_new(chess_move);

        // Irreversible moves make earlier positions unreachable.
        let mut history = if resets_clock {
            Vec::new()
        } else {
            self.history.clone()
        };
        history.push(board.get_hash());

        Position {
            board,
            halfmove_clock: if resets_clock { 0 } else { self.halfmove_clock + 1 },
            fullmove_number: match self.board.side_to_move() {
                Color::Black => self.fullmove_number + 1,
                Color::White => self.fullmove_number,
            },
            history,
        }
    }
}

/// Result of applying a legal move.
#[derive(Debug, Clone)]
pub struct AppliedMove {
    pub position: Position,
    pub record: MoveRecord,
}

/// A pure, synchronous chess oracle.
pub trait RulesEngine: Send + Sync {
    fn initial_position(&self) -> Position;

    /// Validate `request` against `position` and return the resulting position.
    fn apply_move(&self, position: &Position, request: &MoveRequest) -> Result<AppliedMove, Rejection>;

    fn is_checkmate(&self, position: &Position) -> bool;

    fn is_stalemate(&self, position: &Position) -> bool;

    fn is_insufficient_material(&self, position: &Position) -> bool;

    fn is_fifty_move_draw(&self, position: &Position) -> bool;

    fn is_threefold_repetition(&self, position: &Position) -> bool;

    /// Legal moves in UCI notation, optionally only those starting on `from`.
    fn legal_moves(&self, position: &Position, from: Option<&str>) -> Result<Vec<String>, Rejection>;

    /// The first rule that ends the game in `position`, if any.
    fn terminal_state(&self, position: &Position) -> Option<Terminal> {
        if self.is_checkmate(position) {
            Some(Terminal::Checkmate)
        } else if self.is_stalemate(position) {
            Some(Terminal::Draw(DrawRule::Stalemate))
        } else if self.is_insufficient_material(position) {
            Some(Terminal::Draw(DrawRule::InsufficientMaterial))
        } else if self.is_fifty_move_draw(position) {
            Some(Terminal::Draw(DrawRule::FiftyMoves))
        } else if self.is_threefold_repetition(position) {
            Some(Terminal::Draw(DrawRule::ThreefoldRepetition))
        } else {
            None
        }
    }
}

/// Standard chess rules backed by the `chess` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChessRules;

fn parse_square(text: &str) -> Result<Square, Rejection> {
    Square::from_str(&text.trim().to_lowercase())
        .map_err(|_| Rejection::InvalidSquare(text.to_string()))
}

impl RulesEngine for ChessRules {
    fn initial_position(&self) -> Position {
        Position::default()
    }

    fn apply_move(&self, position: &Position, request: &MoveRequest) -> Result<AppliedMove, Rejection> {
        let source = parse_square(&request.from)?;
        let dest = parse_square(&request.to)?;
        let promotion = match &request.promotion {
            Some(designator) => Some(
                parse_promotion(designator)
                    .ok_or_else(|| Rejection::InvalidPromotion(designator.clone()))?,
            ),
            None => None,
        };

        let board = position.board();
        let chess_move = ChessMove::new(source, dest, promotion);
        if !board.legal(chess_move) {
            return Err(Rejection::IllegalMove(chess_move.to_string()));
        }

        let piece = board
            .piece_on(source)
            .ok_or_else(|| Rejection::IllegalMove(chess_move.to_string()))?;
        let record = MoveRecord {
            from: source.to_string(),
            to: dest.to_string(),
            promotion: promotion.map(|p| p.to_string(Color::Black)),
            color: color_name(board.side_to_move()),
            piece: piece_name(piece),
            captured: board.piece_on(dest).map(piece_name),
            uci: chess_move.to_string(),
        };

        Ok(AppliedMove {
            position: position.after(chess_move),
            record,
        })
    }

    fn is_checkmate(&self, position: &Position) -> bool {
        position.board().status() == BoardStatus::Checkmate
    }

    fn is_stalemate(&self, position: &Position) -> bool {
        position.board().status() == BoardStatus::Stalemate
    }

    fn is_insufficient_material(&self, position: &Position) -> bool {
        has_insufficient_material(position.board())
    }

    fn is_fifty_move_draw(&self, position: &Position) -> bool {
        position.halfmove_clock() >= FIFTY_MOVE_HALFMOVES
    }

    fn is_threefold_repetition(&self, position: &Position) -> bool {
        position.repetitions() >= 3
    }

    fn legal_moves(&self, position: &Position, from: Option<&str>) -> Result<Vec<String>, Rejection> {
        let from = from.map(parse_square).transpose()?;
        Ok(MoveGen::new_legal(position.board())
            .filter(|m| from.map_or(true, |square| m.get_source() == square))
            .map(|m| m.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(rules: &ChessRules, moves: &[(&str, &str)]) -> Position {
        moves.iter().fold(rules.initial_position(), |position, (from, to)| {
            rules
                .apply_move(&position, &MoveRequest::new(from, to))
                .expect("legal move")
                .position
        })
    }

    #[test]
    fn applies_a_legal_opening_move() {
        let rules = ChessRules;
        let applied = rules
            .apply_move(&rules.initial_position(), &MoveRequest::new("e2", "e4"))
            .expect("legal");
        assert_eq!(applied.record.uci, "e2e4");
        assert_eq!(applied.record.color, "white");
        assert_eq!(applied.record.piece, "pawn");
        assert_eq!(applied.position.side_to_move(), Color::Black);
        assert_eq!(
            applied.position.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn rejects_illegal_and_malformed_moves() {
        let rules = ChessRules;
        let start = rules.initial_position();
        assert!(matches!(
            rules.apply_move(&start, &MoveRequest::new("e2", "e5")),
            Err(Rejection::IllegalMove(_))
        ));
        assert!(matches!(
            rules.apply_move(&start, &MoveRequest::new("z9", "e4")),
            Err(Rejection::InvalidSquare(_))
        ));
        assert!(matches!(
            rules.apply_move(&start, &MoveRequest::promoting("e2", "e4", "k")),
            Err(Rejection::InvalidPromotion(_))
        ));
    }

    #[test]
    fn detects_fools_mate() {
        let rules = ChessRules;
        let position = play(&rules, &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")]);
        assert!(rules.is_checkmate(&position));
        assert_eq!(rules.terminal_state(&position), Some(Terminal::Checkmate));
    }

    #[test]
    fn detects_threefold_repetition() {
        let rules = ChessRules;
        let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        let once = play(&rules, &shuffle);
        assert_eq!(once.repetitions(), 2);
        assert!(!rules.is_threefold_repetition(&once));

        let twice: Vec<_> = shuffle.iter().chain(shuffle.iter()).copied().collect();
        let position = play(&rules, &twice);
        assert!(rules.is_threefold_repetition(&position));
        assert_eq!(
            rules.terminal_state(&position),
            Some(Terminal::Draw(DrawRule::ThreefoldRepetition))
        );
    }

    #[test]
    fn pawn_moves_reset_the_halfmove_clock() {
        let rules = ChessRules;
        let position = play(&rules, &[("g1", "f3"), ("g8", "f6")]);
        assert_eq!(position.halfmove_clock(), 2);
        let position = rules
            .apply_move(&position, &MoveRequest::new("e2", "e4"))
            .expect("legal")
            .position;
        assert_eq!(position.halfmove_clock(), 0);
    }

    #[test]
    fn lists_legal_moves_from_a_square() {
        let rules = ChessRules;
        let mut moves = rules
            .legal_moves(&rules.initial_position(), Some("g1"))
            .expect("valid square");
        moves.sort();
        assert_eq!(moves, vec!["g1f3".to_string(), "g1h3".to_string()]);
        assert_eq!(
            rules.legal_moves(&rules.initial_position(), None).map(|m| m.len()),
            Ok(20)
        );
    }
}
