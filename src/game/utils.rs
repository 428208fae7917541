use chess::{Board, Color, Piece, Square, ALL_SQUARES};

/// Convert a chess color to a string
pub fn color_to_string(color: Color) -> String {
    color_name(color).to_string()
}

pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}

pub fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

/// Parse a promotion designator (`q`, `r`, `b` or `n`, either case).
pub fn parse_promotion(designator: &str) -> Option<Piece> {
    match designator.to_ascii_lowercase().as_str() {
        "q" => Some(Piece::Queen),
        "r" => Some(Piece::Rook),
        "b" => Some(Piece::Bishop),
        "n" => Some(Piece::Knight),
        _ => None,
    }
}

fn is_light_square(square: Square) -> bool {
    (square.get_rank().to_index() + square.get_file().to_index()) % 2 == 1
}

#[derive(Default)]
struct Material {
    heavy: u32, // pawns, rooks and queens
    knights: u32,
    bishops_light: u32,
    bishops_dark: u32,
}

impl Material {
    fn minors(&self) -> u32 {
        self.knights + self.bishops_light + self.bishops_dark
    }
}

/// Check if the board has insufficient material for checkmate
pub fn has_insufficient_material(board: &Board) -> bool {
    let mut white = Material::default();
    let mut black = Material::default();

    for square in ALL_SQUARES {
        let (Some(piece), Some(color)) = (board.piece_on(square), board.color_on(square)) else {
            continue;
        };
        let side = match color {
            Color::White => &mut white,
            Color::Black => &mut black,
        };
        match piece {
            Piece::Pawn | Piece::Rook | Piece::Queen => side.heavy += 1,
            Piece::Knight => side.knights += 1,
            Piece::Bishop if is_light_square(square) => side.bishops_light += 1,
            Piece::Bishop => side.bishops_dark += 1,
            Piece::King => {}
        }
    }

    if white.heavy > 0 || black.heavy > 0 {
        return false;
    }

    match (white.minors(), black.minors()) {
        // King vs King, or a single minor piece vs a bare king
        (0, 0) | (1, 0) | (0, 1) => true,
        // King and Bishop vs King and Bishop, bishops on the same colour
        (1, 1) if white.knights == 0 && black.knights == 0 => {
            (white.bishops_light == 1 && black.bishops_light == 1)
                || (white.bishops_dark == 1 && black.bishops_dark == 1)
        }
        _ => false,
    }
}
