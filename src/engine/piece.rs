//! Piece representation and pseudo-legal move generation.
//!
//! `possible_moves` respects board edges and occupancy but ignores whether a
//! move leaves the mover's own king in check — the Game layer filters that
//! by simulation. With `calculate_threats` the generator switches to
//! "coverage" semantics for attack-map building: squares occupied by the
//! mover's own colour are included (a piece still covers a defended square)
//! and pawn forward steps are excluded (only the diagonals threaten).

use crate::engine::board::Position;
use crate::engine::types::{Color, Move, PieceKind, Square};

/// Knight move offsets as (file, rank) deltas.
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// King move offsets as (file, rank) deltas.
const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Diagonal ray directions (bishop).
const BISHOP_DIRS: [(i8, i8); 4] = [(-1, 1), (1, 1), (-1, -1), (1, -1)];

/// Straight ray directions (rook).
const ROOK_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, 1), (0, -1)];

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// One chess piece. Stored by value inside the [`Position`]'s board array;
/// its `square` always equals the index of the slot holding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub square: Square,
    can_double_step: bool,
    selected: bool,
}

impl Piece {
    /// Create a piece. A pawn placed on its start rank may still double-step.
    pub fn new(kind: PieceKind, color: Color, square: Square) -> Self {
        Piece {
            kind,
            color,
            square,
            can_double_step: kind == PieceKind::Pawn && square.rank() == color.pawn_start_rank(),
            selected: false,
        }
    }

    /// Whether this pawn may still make its initial double step.
    #[inline]
    pub fn can_double_step(&self) -> bool {
        self.can_double_step
    }

    /// Clear double-step eligibility. Called the first time a pawn moves.
    #[inline]
    pub fn clear_double_step(&mut self) {
        self.can_double_step = false;
    }

    #[inline]
    pub fn select(&mut self) {
        self.selected = true;
    }

    #[inline]
    pub fn deselect(&mut self) {
        self.selected = false;
    }

    #[inline]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    // -----------------------------------------------------------------
    // Pseudo-legal move generation
    // -----------------------------------------------------------------

    /// Generate pseudo-legal moves for this piece.
    ///
    /// Castling and en-passant captures are synthesized by the Game layer;
    /// they need cross-piece state this generator does not see.
    pub fn possible_moves(&self, position: &Position, calculate_threats: bool) -> Vec<Move> {
        match self.kind {
            PieceKind::Knight => self.leaper_moves(position, &KNIGHT_OFFSETS, calculate_threats),
            PieceKind::King => self.leaper_moves(position, &KING_OFFSETS, calculate_threats),
            PieceKind::Bishop => self.ray_moves(position, &BISHOP_DIRS, calculate_threats),
            PieceKind::Rook => self.ray_moves(position, &ROOK_DIRS, calculate_threats),
            PieceKind::Queen => {
                let mut moves = self.ray_moves(position, &BISHOP_DIRS, calculate_threats);
                moves.extend(self.ray_moves(position, &ROOK_DIRS, calculate_threats));
                moves
            }
            PieceKind::Pawn => self.pawn_moves(position, calculate_threats),
        }
    }

    /// Fixed-offset moves (knight, king), filtered to stay on the board.
    fn leaper_moves(
        &self,
        position: &Position,
        offsets: &[(i8, i8)],
        calculate_threats: bool,
    ) -> Vec<Move> {
        let mut moves = Vec::with_capacity(offsets.len());
        for &(df, dr) in offsets {
            let Some(to) = self.square.offset(df, dr) else {
                continue;
            };
            match position.piece_at(to) {
                Some(occupant) if occupant.color == self.color && !calculate_threats => {}
                Some(occupant) if occupant.color != self.color => {
                    moves.push(Move::with_capture(self.square, to, self.kind, occupant.kind));
                }
                _ => moves.push(Move::new(self.square, to, self.kind)),
            }
        }
        moves
    }

    /// Ray-walk moves (bishop, rook, and both halves of the queen): step in
    /// each direction until the board edge, an own piece (stop; included
    /// only as a threat), or an enemy piece (include, stop).
    fn ray_moves(
        &self,
        position: &Position,
        dirs: &[(i8, i8)],
        calculate_threats: bool,
    ) -> Vec<Move> {
        let mut moves = Vec::with_capacity(16);
        for &(df, dr) in dirs {
            let mut current = self.square;
            while let Some(to) = current.offset(df, dr) {
                match position.piece_at(to) {
                    None => moves.push(Move::new(self.square, to, self.kind)),
                    Some(occupant) if occupant.color == self.color => {
                        if calculate_threats {
                            moves.push(Move::new(self.square, to, self.kind));
                        }
                        break;
                    }
                    Some(occupant) => {
                        moves.push(Move::with_capture(self.square, to, self.kind, occupant.kind));
                        break;
                    }
                }
                current = to;
            }
        }
        moves
    }

    /// Pawn moves: single step onto an empty square, double step while the
    /// piece has never moved, diagonal captures onto enemy pieces. In threat
    /// mode only the diagonals count, and they count regardless of occupancy.
    fn pawn_moves(&self, position: &Position, calculate_threats: bool) -> Vec<Move> {
        let mut moves = Vec::with_capacity(4);
        let dir = self.color.pawn_direction();

        if !calculate_threats {
            if let Some(single) = self.square.offset(0, dir) {
                if position.piece_at(single).is_none() {
                    moves.push(Move::new(self.square, single, self.kind));

                    if self.can_double_step {
                        if let Some(double) = self.square.offset(0, 2 * dir) {
                            if position.piece_at(double).is_none() {
                                moves.push(Move::new(self.square, double, self.kind));
                            }
                        }
                    }
                }
            }
        }

        for df in [-1i8, 1] {
            let Some(to) = self.square.offset(df, dir) else {
                continue;
            };
            match position.piece_at(to) {
                Some(occupant) if occupant.color != self.color => {
                    moves.push(Move::with_capture(self.square, to, self.kind, occupant.kind));
                }
                _ if calculate_threats => moves.push(Move::new(self.square, to, self.kind)),
                _ => {}
            }
        }

        moves
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
