//! Static position evaluation.
//!
//! Search leaves are scored by material balance alone: White material minus
//! Black material, in centipawns, using the standard piece values. Positive
//! favours White, negative favours Black.

use crate::engine::board::Position;
use crate::engine::types::Color;

/// Material difference of a position in centipawns.
pub fn material_difference(position: &Position) -> i32 {
    position
        .pieces()
        .map(|p| match p.color {
            Color::White => p.kind.value(),
            Color::Black => -p.kind.value(),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::piece::Piece;
    use crate::engine::types::{PieceKind, Square};

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn starting_position_is_balanced() {
        assert_eq!(material_difference(&Position::starting()), 0);
    }

    #[test]
    fn extra_white_queen_is_positive() {
        let mut pos = Position::with_kings(sq("e1"), sq("e8"));
        pos.place(Piece::new(PieceKind::Queen, Color::White, sq("d1")));
        assert_eq!(material_difference(&pos), 900);
    }

    #[test]
    fn extra_black_rook_is_negative() {
        let mut pos = Position::with_kings(sq("e1"), sq("e8"));
        pos.place(Piece::new(PieceKind::Rook, Color::Black, sq("a8")));
        assert_eq!(material_difference(&pos), -500);
    }

    #[test]
    fn kings_do_not_count() {
        let pos = Position::with_kings(sq("e1"), sq("e8"));
        assert_eq!(material_difference(&pos), 0);
    }

    #[test]
    fn mixed_material_sums() {
        let mut pos = Position::with_kings(sq("e1"), sq("e8"));
        pos.place(Piece::new(PieceKind::Knight, Color::White, sq("b1")));
        pos.place(Piece::new(PieceKind::Bishop, Color::White, sq("c1")));
        pos.place(Piece::new(PieceKind::Pawn, Color::Black, sq("a7")));
        assert_eq!(material_difference(&pos), 320 + 330 - 100);
    }
}
