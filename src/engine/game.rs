//! Stateful game controller wrapping Position.
//!
//! `Game` owns the board plus all cross-cutting state: castling rights,
//! check flags, the en-passant target, attack maps, the fifty-move counter,
//! a pending promotion, and the terminal status. It filters pseudo-legal
//! moves into legal moves by simulating each candidate on a clone, and it is
//! the primary type the UI layer and the AI interact with.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::board::Position;
use crate::engine::piece::Piece;
use crate::engine::types::{
    Bitboard, CastleSide, CastlingRights, ChessError, Color, DrawReason, GameStatus, Move,
    PieceKind, Square,
};

// =========================================================================
// View / outcome types for the UI layer
// =========================================================================

/// Read-only piece snapshot handed to the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PieceView {
    pub kind: PieceKind,
    pub color: Color,
    pub is_selected: bool,
}

/// What a successfully accepted move request resulted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The ply completed and the turn flipped.
    Applied,
    /// A pawn reached the back rank; the ply is suspended until
    /// [`Game::promote`] supplies a piece kind.
    AwaitingPromotion,
}

// =========================================================================
// Castling-rights mask
// =========================================================================

/// Mask table indexed by square. When a move touches a square, AND the
/// castling rights with this mask: moving the king clears both of that
/// side's rights, and moving (or capturing) a rook on its home square
/// clears the matching one. Rights are never restored.
#[rustfmt::skip]
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [0b1111u8; 64];
    // a1: white long rook home
    mask[0]  = 0b1111 & !CastlingRights::WHITE_LONG;
    // e1: white king home
    mask[4]  = 0b1111 & !(CastlingRights::WHITE_SHORT | CastlingRights::WHITE_LONG);
    // h1: white short rook home
    mask[7]  = 0b1111 & !CastlingRights::WHITE_SHORT;
    // a8: black long rook home
    mask[56] = 0b1111 & !CastlingRights::BLACK_LONG;
    // e8: black king home
    mask[60] = 0b1111 & !(CastlingRights::BLACK_SHORT | CastlingRights::BLACK_LONG);
    // h8: black short rook home
    mask[63] = 0b1111 & !CastlingRights::BLACK_SHORT;
    mask
};

/// For a king destination square (after castling), return (rook_from, rook_to).
fn castling_rook_squares(king_to: Square) -> (Square, Square) {
    let rank = king_to.rank();
    match king_to.file() {
        // Short: king e→g, rook h→f.
        6 => (
            Square::from_file_rank(7, rank),
            Square::from_file_rank(5, rank),
        ),
        // Long: king e→c, rook a→d.
        2 => (
            Square::from_file_rank(0, rank),
            Square::from_file_rank(3, rank),
        ),
        _ => panic!("invalid castling king destination: {king_to}"),
    }
}

// =========================================================================
// Game
// =========================================================================

/// A complete chess game.
#[derive(Clone, Debug)]
pub struct Game {
    // Core state
    position: Position,
    turn: Color,
    castling: CastlingRights,
    white_in_check: bool,
    black_in_check: bool,
    en_passant_target: Option<Square>,
    white_attacks: Bitboard,
    black_attacks: Bitboard,
    fifty_move_counter: u16,
    pending_promotion: Option<Square>,
    status: GameStatus,

    // Metadata
    pub id: String,
    pub white_player: String,
    pub black_player: String,
    pub created_at: DateTime<Utc>,
}

impl Game {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// Create a new game from the standard starting position.
    pub fn new() -> Self {
        let mut game = Self::bare(Position::starting(), Color::White, CastlingRights::ALL);
        game.update_attack_maps();
        game.refresh_check_flags();
        game
    }

    /// Create a game from an arbitrary position and side to move.
    ///
    /// Castling rights are granted only where the king and the relevant rook
    /// still stand on their home squares. Terminal conditions (stalemate,
    /// checkmate, insufficient material) are detected immediately.
    pub fn from_position(position: Position, turn: Color) -> Self {
        let castling = derive_castling_rights(&position);
        let mut game = Self::bare(position, turn, castling);
        game.update_attack_maps();
        game.refresh_check_flags();
        game.check_game_end(turn);
        game
    }

    fn bare(position: Position, turn: Color, castling: CastlingRights) -> Self {
        Game {
            position,
            turn,
            castling,
            white_in_check: false,
            black_in_check: false,
            en_passant_target: None,
            white_attacks: Bitboard::EMPTY,
            black_attacks: Bitboard::EMPTY,
            fifty_move_counter: 0,
            pending_promotion: None,
            status: GameStatus::Playing,
            id: Uuid::new_v4().to_string(),
            white_player: "Player".into(),
            black_player: "Player".into(),
            created_at: Utc::now(),
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    /// Current board position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Current game status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Side to move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Whether the game has reached a terminal status.
    pub fn is_over(&self) -> bool {
        self.status.is_game_over()
    }

    /// Whether the given colour's king is currently attacked.
    pub fn in_check(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_in_check,
            Color::Black => self.black_in_check,
        }
    }

    /// The colour's attack map (recomputed wholesale each ply).
    pub fn attack_map(&self, color: Color) -> Bitboard {
        match color {
            Color::White => self.white_attacks,
            Color::Black => self.black_attacks,
        }
    }

    /// Current castling availability.
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    /// En-passant target square, if the previous ply was a double step.
    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    /// Half-moves since the last pawn move or capture.
    pub fn fifty_move_counter(&self) -> u16 {
        self.fifty_move_counter
    }

    /// Square of the pawn awaiting promotion, if any.
    pub fn pending_promotion(&self) -> Option<Square> {
        self.pending_promotion
    }

    /// Read-only piece snapshot for the rendering layer.
    pub fn get_piece(&self, sq: Square) -> Option<PieceView> {
        self.position.piece_at(sq).map(|p| PieceView {
            kind: p.kind,
            color: p.color,
            is_selected: p.is_selected(),
        })
    }

    /// Printable 8×8 diagram of the current position.
    pub fn board_text(&self) -> String {
        self.position.board_text()
    }

    // -----------------------------------------------------------------
    // Selection (drag support for the UI layer)
    // -----------------------------------------------------------------

    /// Mark the piece on `sq` as selected. Only the side to move's pieces
    /// can be picked up.
    pub fn select(&mut self, sq: Square) -> Result<(), ChessError> {
        let piece = self
            .position
            .piece_at(sq)
            .ok_or(ChessError::NoPieceOnSquare(sq))?;
        if piece.color != self.turn {
            return Err(ChessError::WrongSideToMove(self.turn));
        }
        self.position.deselect_all();
        if let Some(piece) = self.position.piece_at_mut(sq) {
            piece.select();
        }
        Ok(())
    }

    /// Clear any selection.
    pub fn deselect_all(&mut self) {
        self.position.deselect_all();
    }

    // -----------------------------------------------------------------
    // Attack maps and check detection
    // -----------------------------------------------------------------

    /// Recompute both attack maps from scratch: for every piece on the
    /// board, mark every square it covers (threat-mode move generation).
    pub fn update_attack_maps(&mut self) {
        let mut white = Bitboard::EMPTY;
        let mut black = Bitboard::EMPTY;
        for piece in self.position.pieces() {
            let map = match piece.color {
                Color::White => &mut white,
                Color::Black => &mut black,
            };
            for mv in piece.possible_moves(&self.position, true) {
                map.set(mv.to);
            }
        }
        self.white_attacks = white;
        self.black_attacks = black;
    }

    fn refresh_check_flags(&mut self) {
        self.white_in_check = self
            .black_attacks
            .is_set(self.position.king_square(Color::White));
        self.black_in_check = self
            .white_attacks
            .is_set(self.position.king_square(Color::Black));
    }

    // -----------------------------------------------------------------
    // Castling
    // -----------------------------------------------------------------

    /// Whether `color` may castle to the given side right now: the right
    /// must be intact, the king not in check, the squares between king and
    /// rook empty, and every square the king transits through (destination
    /// included) absent from the opponent's attack map.
    pub fn can_castle(&self, color: Color, side: CastleSide) -> bool {
        let allowed = match side {
            CastleSide::Short => self.castling.can_castle_short(color),
            CastleSide::Long => self.castling.can_castle_long(color),
        };
        if !allowed || self.in_check(color) {
            return false;
        }

        let home = color.home_rank();
        let enemy_map = self.attack_map(!color);
        let empty = |file: u8| {
            self.position
                .piece_at(Square::from_file_rank(file, home))
                .is_none()
        };
        let safe = |file: u8| !enemy_map.is_set(Square::from_file_rank(file, home));

        match side {
            // King e→g: f and g must be empty and unattacked.
            CastleSide::Short => empty(5) && empty(6) && safe(5) && safe(6),
            // King e→c: b, c, d must be empty; c and d unattacked.
            CastleSide::Long => empty(1) && empty(2) && empty(3) && safe(2) && safe(3),
        }
    }

    // -----------------------------------------------------------------
    // Legal move generation
    // -----------------------------------------------------------------

    /// All legal moves for the piece on `from`. Empty when the square is
    /// empty, the game is over, or a promotion is pending.
    pub fn legal_moves_from(&self, from: Square) -> Vec<Move> {
        if self.status.is_game_over() || self.pending_promotion.is_some() {
            return Vec::new();
        }
        let Some(piece) = self.position.piece_at(from) else {
            return Vec::new();
        };
        let piece = *piece;

        let mut candidates = piece.possible_moves(&self.position, false);

        // Castling: synthesized here because it needs cross-piece state
        // (rook presence, transit-square safety).
        if piece.kind == PieceKind::King {
            for side in [CastleSide::Short, CastleSide::Long] {
                if self.can_castle(piece.color, side) {
                    let file = match side {
                        CastleSide::Short => 6,
                        CastleSide::Long => 2,
                    };
                    let to = Square::from_file_rank(file, piece.color.home_rank());
                    candidates.push(Move::new(from, to, PieceKind::King));
                }
            }
        }

        // En passant: the capture square comes from game state, not from
        // the board contents. Only a pawn on its capture rank (rank 5 for
        // White, rank 2 for Black) can take the window.
        if piece.kind == PieceKind::Pawn {
            if let Some(target) = self.en_passant_target {
                let dir = piece.color.pawn_direction();
                let capture_rank = match piece.color {
                    Color::White => 5,
                    Color::Black => 2,
                };
                if target.rank() == capture_rank
                    && (from.offset(-1, dir) == Some(target)
                        || from.offset(1, dir) == Some(target))
                {
                    candidates.push(Move::with_capture(
                        from,
                        target,
                        PieceKind::Pawn,
                        PieceKind::Pawn,
                    ));
                }
            }
        }

        // The authoritative legality test: simulate each candidate on a
        // clone and reject it if the mover's own king ends up attacked.
        candidates.retain(|mv| self.move_is_safe(piece.color, mv));
        candidates
    }

    /// Legal destination squares from `from`, for highlighting and drag
    /// validation.
    pub fn legal_moves_for(&self, from: Square) -> Vec<Square> {
        self.legal_moves_from(from).iter().map(|m| m.to).collect()
    }

    /// All legal moves for one colour.
    pub fn all_legal_moves(&self, color: Color) -> Vec<Move> {
        let squares: Vec<Square> = self.position.pieces_of(color).map(|p| p.square).collect();
        let mut moves = Vec::new();
        for sq in squares {
            moves.extend(self.legal_moves_from(sq));
        }
        moves
    }

    /// Whether the colour has any legal move at all. Distinguishes
    /// checkmate from stalemate.
    pub fn has_legal_move(&self, color: Color) -> bool {
        self.position
            .pieces_of(color)
            .map(|p| p.square)
            .collect::<Vec<_>>()
            .into_iter()
            .any(|sq| !self.legal_moves_from(sq).is_empty())
    }

    /// Simulate `mv` on a deep clone and report whether the mover's king
    /// survives unattacked.
    fn move_is_safe(&self, mover: Color, mv: &Move) -> bool {
        let mut sim = self.clone();
        let ep_target = sim.en_passant_target;
        sim.move_with_side_effects(mv, ep_target);
        sim.update_attack_maps();
        let king = sim.position.king_square(mover);
        !sim.attack_map(!mover).is_set(king)
    }

    /// Move execution with special-move side effects but no state
    /// bookkeeping: relocates the rook on a castling king move and removes
    /// the passed pawn on an en-passant capture. Returns `true` when the
    /// moved pawn landed on the back rank and the ply must suspend for a
    /// promotion choice. Shared between the legality simulation and the
    /// real move path.
    fn move_with_side_effects(&mut self, mv: &Move, ep_target: Option<Square>) -> bool {
        // En-passant capture: the captured pawn is not on the target square.
        if mv.kind == PieceKind::Pawn && Some(mv.to) == ep_target {
            let passed = Square::from_file_rank(mv.to.file(), mv.from.rank());
            self.position.remove(passed);
        }

        let mover = self
            .position
            .piece_at(mv.from)
            .expect("move source square must be occupied")
            .color;
        self.position.make_move(mv.from, mv.to);

        // Castling: a king moving two files drags the matching rook along.
        if mv.kind == PieceKind::King
            && (mv.from.file() as i8 - mv.to.file() as i8).abs() == 2
        {
            let (rook_from, rook_to) = castling_rook_squares(mv.to);
            self.position.make_move(rook_from, rook_to);
        }

        mv.kind == PieceKind::Pawn && mv.to.rank() == mover.promotion_rank()
    }

    // -----------------------------------------------------------------
    // Move application — the full-ply state machine
    // -----------------------------------------------------------------

    /// Validated public entry point: look the request up in the legal-move
    /// set and apply it. The game state is untouched on any error.
    pub fn attempt_move(&mut self, from: Square, to: Square) -> Result<MoveOutcome, ChessError> {
        if self.status.is_game_over() {
            return Err(ChessError::GameOver(self.status));
        }
        if let Some(sq) = self.pending_promotion {
            return Err(ChessError::PromotionPending(sq));
        }
        let piece = self
            .position
            .piece_at(from)
            .ok_or(ChessError::NoPieceOnSquare(from))?;
        if piece.color != self.turn {
            return Err(ChessError::WrongSideToMove(self.turn));
        }
        let mv = self
            .legal_moves_from(from)
            .into_iter()
            .find(|m| m.to == to)
            .ok_or(ChessError::IllegalMove { from, to })?;
        Ok(self.apply_legal(mv))
    }

    /// Apply a move already known to be legal for the side to move.
    ///
    /// Steps: castling-rights update, en-passant bookkeeping, board
    /// mutation with side effects, fifty-move counter, then either the
    /// promotion suspension or the end-of-ply refresh (attack maps, check
    /// flags, termination detection, turn flip).
    pub(crate) fn apply_legal(&mut self, mv: Move) -> MoveOutcome {
        // Castling rights: touching a king or rook home square clears the
        // matching right, whether by moving or by capture.
        self.castling.0 &= CASTLING_MASK[mv.from.0 as usize];
        self.castling.0 &= CASTLING_MASK[mv.to.0 as usize];

        // The old en-passant target is consumed this ply.
        let old_ep = self.en_passant_target.take();
        let is_ep_capture = mv.kind == PieceKind::Pawn && Some(mv.to) == old_ep;
        let is_capture = is_ep_capture || self.position.piece_at(mv.to).is_some();

        let requires_promotion = self.move_with_side_effects(&mv, old_ep);

        if mv.kind == PieceKind::Pawn {
            if let Some(pawn) = self.position.piece_at_mut(mv.to) {
                pawn.clear_double_step();
            }
            // A double step opens an en-passant window for the opponent's
            // next ply only.
            let rank_delta = mv.to.rank() as i8 - mv.from.rank() as i8;
            if rank_delta.abs() == 2 {
                let skipped = (mv.from.rank() as i8 + rank_delta / 2) as u8;
                self.en_passant_target = Some(Square::from_file_rank(mv.from.file(), skipped));
            }
        }

        if mv.kind == PieceKind::Pawn || is_capture {
            self.fifty_move_counter = 0;
        } else {
            self.fifty_move_counter += 1;
        }

        // A pawn reaching the back rank suspends the ply: the turn does not
        // flip until promote() supplies a piece kind.
        if requires_promotion {
            self.pending_promotion = Some(mv.to);
            return MoveOutcome::AwaitingPromotion;
        }

        self.finish_ply();
        MoveOutcome::Applied
    }

    /// Replace the pending pawn with the chosen piece and complete the
    /// suspended ply.
    pub fn promote(&mut self, kind: PieceKind) -> Result<(), ChessError> {
        let sq = self
            .pending_promotion
            .ok_or(ChessError::NoPendingPromotion)?;
        if matches!(kind, PieceKind::Pawn | PieceKind::King) {
            return Err(ChessError::InvalidPromotionKind(kind));
        }

        let color = self
            .position
            .piece_at(sq)
            .expect("pending promotion square must hold the pawn")
            .color;
        self.position.place(Piece::new(kind, color, sq));
        self.pending_promotion = None;

        self.finish_ply();
        Ok(())
    }

    /// End-of-ply refresh: attack maps, check flags, termination detection,
    /// turn flip — in that order.
    fn finish_ply(&mut self) {
        self.update_attack_maps();
        self.refresh_check_flags();
        self.check_game_end(!self.turn);
        self.turn = !self.turn;
    }

    // -----------------------------------------------------------------
    // Termination detection
    // -----------------------------------------------------------------

    /// Detect a terminal state after a completed ply. `to_move` is the side
    /// about to move next.
    fn check_game_end(&mut self, to_move: Color) {
        if !self.has_legal_move(to_move) {
            self.status = if self.in_check(to_move) {
                // Checkmate: the mover wins.
                GameStatus::win_for(!to_move)
            } else {
                GameStatus::Draw(DrawReason::Stalemate)
            };
            return;
        }

        if self.insufficient_material() {
            self.status = GameStatus::Draw(DrawReason::InsufficientMaterial);
            return;
        }

        if self.fifty_move_counter >= 100 {
            self.status = GameStatus::Draw(DrawReason::FiftyMoveRule);
        }
    }

    /// Insufficient-material detection.
    ///
    /// Draws: K vs K, K+minor vs K, K+B vs K+B with same-coloured bishops.
    fn insufficient_material(&self) -> bool {
        let mut minors = [0u32; 2];
        let mut bishop_count = [0u32; 2];
        let mut bishop_square = [None; 2];

        for piece in self.position.pieces() {
            let idx = piece.color.index();
            match piece.kind {
                PieceKind::Pawn | PieceKind::Rook | PieceKind::Queen => return false,
                PieceKind::Knight => minors[idx] += 1,
                PieceKind::Bishop => {
                    minors[idx] += 1;
                    bishop_count[idx] += 1;
                    bishop_square[idx] = Some(piece.square);
                }
                PieceKind::King => {}
            }
        }

        // K vs K
        if minors == [0, 0] {
            return true;
        }

        // K+minor vs K
        if minors[0] + minors[1] == 1 {
            return true;
        }

        // K+B vs K+B with bishops on same-coloured squares
        if minors == [1, 1] && bishop_count == [1, 1] {
            let shade = |sq: Square| (sq.rank() + sq.file()) & 1;
            let (Some(w), Some(b)) = (bishop_square[0], bishop_square[1]) else {
                return false;
            };
            if shade(w) == shade(b) {
                return true;
            }
        }

        false
    }

    // -----------------------------------------------------------------
    // Test support
    // -----------------------------------------------------------------

    #[cfg(test)]
    pub(crate) fn set_fifty_move_counter(&mut self, value: u16) {
        self.fifty_move_counter = value;
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

/// Castling rights implied by piece placement: a right survives only while
/// the king and the relevant rook both stand on their home squares.
fn derive_castling_rights(position: &Position) -> CastlingRights {
    let mut rights = CastlingRights::NONE;
    for color in [Color::White, Color::Black] {
        let home = color.home_rank();
        let king_home = position
            .piece_at(Square::from_file_rank(4, home))
            .map(|p| p.kind == PieceKind::King && p.color == color)
            .unwrap_or(false);
        if !king_home {
            continue;
        }
        let rook_at = |file: u8| {
            position
                .piece_at(Square::from_file_rank(file, home))
                .map(|p| p.kind == PieceKind::Rook && p.color == color)
                .unwrap_or(false)
        };
        if rook_at(7) {
            rights.0 |= CastlingRights::short_flag(color);
        }
        if rook_at(0) {
            rights.0 |= CastlingRights::long_flag(color);
        }
    }
    rights
}

// =========================================================================
// Tests
// =========================================================================
