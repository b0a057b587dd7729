//! Mailbox position representation.
//!
//! `Position` stores pieces by value in a fixed 64-slot array, plus cached
//! king squares for both colours. Cloning a `Position` deep-copies the
//! array, so every legality-check simulation and search-tree branch works on
//! fully independent state with no aliasing.

use crate::engine::piece::Piece;
use crate::engine::types::{Color, PieceKind, Square};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A complete board position: 64 optional piece slots and the two king
/// squares. Invariants: every occupied slot's piece carries the slot's own
/// index as its `square`, and each cached king square points at a king of
/// the matching colour. Exactly one king per colour exists at all times.
#[derive(Clone, Debug)]
pub struct Position {
    squares: [Option<Piece>; 64],
    white_king: Square,
    black_king: Square,
}

impl Position {
    // -----------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------

    /// Standard starting position.
    pub fn starting() -> Self {
        let mut pos = Position {
            squares: [None; 64],
            white_king: Square::from_file_rank(4, 0),
            black_king: Square::from_file_rank(4, 7),
        };

        // Pawns
        for file in 0..8 {
            pos.place(Piece::new(
                PieceKind::Pawn,
                Color::White,
                Square::from_file_rank(file, 1),
            ));
            pos.place(Piece::new(
                PieceKind::Pawn,
                Color::Black,
                Square::from_file_rank(file, 6),
            ));
        }

        // Back ranks
        let back_rank: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, &kind) in back_rank.iter().enumerate() {
            pos.place(Piece::new(
                kind,
                Color::White,
                Square::from_file_rank(file as u8, 0),
            ));
            pos.place(Piece::new(
                kind,
                Color::Black,
                Square::from_file_rank(file as u8, 7),
            ));
        }

        pos
    }

    /// An otherwise empty board holding only the two kings. Scenario and
    /// test setups place further pieces on top with [`Position::place`].
    pub fn with_kings(white_king: Square, black_king: Square) -> Self {
        let mut pos = Position {
            squares: [None; 64],
            white_king,
            black_king,
        };
        pos.place(Piece::new(PieceKind::King, Color::White, white_king));
        pos.place(Piece::new(PieceKind::King, Color::Black, black_king));
        pos
    }

    // -----------------------------------------------------------------
    // Piece placement
    // -----------------------------------------------------------------

    /// Put a piece on its own square, replacing any occupant.
    pub fn place(&mut self, piece: Piece) {
        if piece.kind == PieceKind::King {
            match piece.color {
                Color::White => self.white_king = piece.square,
                Color::Black => self.black_king = piece.square,
            }
        }
        self.squares[piece.square.0 as usize] = Some(piece);
    }

    /// Remove and return the piece on a square, if any.
    pub fn remove(&mut self, sq: Square) -> Option<Piece> {
        self.squares[sq.0 as usize].take()
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// The piece on a square, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<&Piece> {
        self.squares[sq.0 as usize].as_ref()
    }

    /// Mutable access to the piece on a square.
    #[inline]
    pub fn piece_at_mut(&mut self, sq: Square) -> Option<&mut Piece> {
        self.squares[sq.0 as usize].as_mut()
    }

    /// Cached king square for the given colour.
    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        match color {
            Color::White => self.white_king,
            Color::Black => self.black_king,
        }
    }

    /// Iterate over all pieces on the board.
    pub fn pieces(&self) -> impl Iterator<Item = &Piece> {
        self.squares.iter().filter_map(|slot| slot.as_ref())
    }

    /// Iterate over all pieces of one colour.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = &Piece> + '_ {
        self.pieces().filter(move |p| p.color == color)
    }

    // -----------------------------------------------------------------
    // Raw move execution
    // -----------------------------------------------------------------

    /// Unconditional placement: clear `from`, put the piece on `to`, update
    /// its own square (and the king cache when a king moves). Returns the
    /// captured occupant, if any. Contains no legality checking — this is
    /// invoked both for real move application and inside every
    /// legality-check clone.
    pub fn make_move(&mut self, from: Square, to: Square) -> Option<Piece> {
        let mut piece = self.squares[from.0 as usize]
            .take()
            .expect("make_move source square must be occupied");
        piece.square = to;
        if piece.kind == PieceKind::King {
            match piece.color {
                Color::White => self.white_king = to,
                Color::Black => self.black_king = to,
            }
        }
        self.squares[to.0 as usize].replace(piece)
    }

    // -----------------------------------------------------------------
    // Selection (backs the UI's drag state)
    // -----------------------------------------------------------------

    /// Clear the selected flag on every piece.
    pub fn deselect_all(&mut self) {
        for slot in self.squares.iter_mut() {
            if let Some(piece) = slot {
                piece.deselect();
            }
        }
    }

    // -----------------------------------------------------------------
    // Consistency check (debug builds)
    // -----------------------------------------------------------------

    /// Verify the slot/square invariant and the king caches.
    #[cfg(any(debug_assertions, test))]
    pub fn assert_consistent(&self) {
        for (idx, slot) in self.squares.iter().enumerate() {
            if let Some(piece) = slot {
                assert_eq!(
                    piece.square.0 as usize, idx,
                    "piece square out of sync with its slot"
                );
            }
        }
        for color in [Color::White, Color::Black] {
            let cached = self.king_square(color);
            let king = self.piece_at(cached).expect("king cache points at empty square");
            assert_eq!(king.kind, PieceKind::King, "king cache mismatch for {color}");
            assert_eq!(king.color, color, "king cache colour mismatch");
            let count = self
                .pieces_of(color)
                .filter(|p| p.kind == PieceKind::King)
                .count();
            assert_eq!(count, 1, "{color} must have exactly one king");
        }
    }

    // -----------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top).
    pub fn board_text(&self) -> String {
        let mut s = String::with_capacity(200);
        for rank in (0..8).rev() {
            s.push((b'1' + rank) as char);
            s.push(' ');
            for file in 0..8 {
                let sq = Square::from_file_rank(file, rank);
                let ch = match self.piece_at(sq) {
                    Some(p) => p.kind.to_char(p.color),
                    None => '.',
                };
                s.push(ch);
                if file < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.board_text())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    // ===================================================================
    // Starting position
    // ===================================================================

    #[test]
    fn starting_position_piece_count() {
        let pos = Position::starting();
        assert_eq!(pos.pieces().count(), 32);
        assert_eq!(pos.pieces_of(Color::White).count(), 16);
        assert_eq!(pos.pieces_of(Color::Black).count(), 16);
    }

    #[test]
    fn starting_position_back_ranks() {
        let pos = Position::starting();
        for (file, kind) in [
            (0u8, PieceKind::Rook),
            (1, PieceKind::Knight),
            (2, PieceKind::Bishop),
            (3, PieceKind::Queen),
            (4, PieceKind::King),
            (5, PieceKind::Bishop),
            (6, PieceKind::Knight),
            (7, PieceKind::Rook),
        ] {
            let white = pos.piece_at(Square::from_file_rank(file, 0)).unwrap();
            assert_eq!((white.kind, white.color), (kind, Color::White));
            let black = pos.piece_at(Square::from_file_rank(file, 7)).unwrap();
            assert_eq!((black.kind, black.color), (kind, Color::Black));
        }
    }

    #[test]
    fn starting_position_pawns() {
        let pos = Position::starting();
        for file in 0..8 {
            let white = pos.piece_at(Square::from_file_rank(file, 1)).unwrap();
            assert_eq!((white.kind, white.color), (PieceKind::Pawn, Color::White));
            assert!(white.can_double_step());
            let black = pos.piece_at(Square::from_file_rank(file, 6)).unwrap();
            assert_eq!((black.kind, black.color), (PieceKind::Pawn, Color::Black));
            assert!(black.can_double_step());
        }
    }

    #[test]
    fn starting_position_middle_empty() {
        let pos = Position::starting();
        for rank in 2..=5 {
            for file in 0..8 {
                assert!(pos.piece_at(Square::from_file_rank(file, rank)).is_none());
            }
        }
    }

    #[test]
    fn starting_position_kings_cached() {
        let pos = Position::starting();
        assert_eq!(pos.king_square(Color::White), sq("e1"));
        assert_eq!(pos.king_square(Color::Black), sq("e8"));
        pos.assert_consistent();
    }

    // ===================================================================
    // place / remove
    // ===================================================================

    #[test]
    fn place_and_remove() {
        let mut pos = Position::with_kings(sq("e1"), sq("e8"));
        pos.place(Piece::new(PieceKind::Knight, Color::White, sq("d4")));
        assert_eq!(pos.piece_at(sq("d4")).unwrap().kind, PieceKind::Knight);

        let removed = pos.remove(sq("d4")).unwrap();
        assert_eq!(removed.kind, PieceKind::Knight);
        assert!(pos.piece_at(sq("d4")).is_none());
    }

    #[test]
    fn with_kings_places_both_kings() {
        let pos = Position::with_kings(sq("c3"), sq("g7"));
        assert_eq!(pos.king_square(Color::White), sq("c3"));
        assert_eq!(pos.king_square(Color::Black), sq("g7"));
        assert_eq!(pos.pieces().count(), 2);
        pos.assert_consistent();
    }

    // ===================================================================
    // make_move
    // ===================================================================

    #[test]
    fn make_move_relocates_piece() {
        let mut pos = Position::starting();
        let captured = pos.make_move(sq("e2"), sq("e4"));
        assert!(captured.is_none());
        assert!(pos.piece_at(sq("e2")).is_none());
        let pawn = pos.piece_at(sq("e4")).unwrap();
        assert_eq!(pawn.kind, PieceKind::Pawn);
        assert_eq!(pawn.square, sq("e4"));
        pos.assert_consistent();
    }

    #[test]
    fn make_move_returns_captured_piece() {
        let mut pos = Position::with_kings(sq("e1"), sq("e8"));
        pos.place(Piece::new(PieceKind::Rook, Color::White, sq("a1")));
        pos.place(Piece::new(PieceKind::Knight, Color::Black, sq("a8")));
        let captured = pos.make_move(sq("a1"), sq("a8")).unwrap();
        assert_eq!(captured.kind, PieceKind::Knight);
        assert_eq!(captured.color, Color::Black);
        assert_eq!(pos.piece_at(sq("a8")).unwrap().color, Color::White);
    }

    #[test]
    fn make_move_updates_king_cache() {
        let mut pos = Position::with_kings(sq("e1"), sq("e8"));
        pos.make_move(sq("e1"), sq("d2"));
        assert_eq!(pos.king_square(Color::White), sq("d2"));
        pos.assert_consistent();
    }

    // ===================================================================
    // Cloning
    // ===================================================================

    #[test]
    fn clone_is_independent() {
        let original = Position::starting();
        let mut copy = original.clone();
        copy.make_move(sq("e2"), sq("e4"));

        assert!(original.piece_at(sq("e2")).is_some());
        assert!(original.piece_at(sq("e4")).is_none());
        assert!(copy.piece_at(sq("e4")).is_some());
    }

    // ===================================================================
    // Board display
    // ===================================================================

    #[test]
    fn board_text_starting() {
        let pos = Position::starting();
        let s = pos.board_text();
        assert!(s.starts_with("8 r n b q k b n r"));
        assert!(s.ends_with("a b c d e f g h"));
        assert!(s.contains("1 R N B Q K B N R"));
    }

    #[test]
    fn deselect_all_clears_flags() {
        let mut pos = Position::starting();
        pos.piece_at_mut(sq("e2")).unwrap().select();
        assert!(pos.piece_at(sq("e2")).unwrap().is_selected());
        pos.deselect_all();
        assert!(!pos.piece_at(sq("e2")).unwrap().is_selected());
    }
}
