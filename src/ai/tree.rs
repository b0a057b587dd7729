//! Minimax search tree.
//!
//! Every node owns a cloned [`Game`] snapshot, so search branches never
//! touch the live game. `search` runs a fixed number of expansion
//! iterations: walk the current best line down to a leaf, expand that leaf
//! one ply, then re-evaluate every ancestor on the unwind so scores and
//! best-move links stay consistent with the new subtree.

use crate::ai::evaluation::material_difference;
use crate::engine::game::{Game, MoveOutcome};
use crate::engine::types::{ChessError, Color, Move, PieceKind};

// =========================================================================
// SearchNode
// =========================================================================

/// One node of the search tree. The parent owns its children; walking back
/// up happens on the call-stack unwind rather than through back-references.
pub struct SearchNode {
    game: Game,
    mover: Color,
    children: Vec<(Move, SearchNode)>,
    expanded: bool,
    score: i32,
    best: Option<usize>,
}

impl SearchNode {
    /// A fresh, unexpanded node scored statically.
    fn leaf(game: Game) -> Self {
        let mover = game.turn();
        let score = material_difference(game.position());
        SearchNode {
            game,
            mover,
            children: Vec::new(),
            expanded: false,
            score,
            best: None,
        }
    }

    /// Expand one ply: create a child for every legal move of the side to
    /// move, each holding its own cloned snapshot with the move applied. A
    /// terminal position (game over) expands to zero children and keeps its
    /// static score. Search-internal promotions always queen.
    fn expand(&mut self) {
        self.expanded = true;
        if self.game.is_over() {
            return;
        }
        for mv in self.game.all_legal_moves(self.mover) {
            let mut child_game = self.game.clone();
            let mut played = mv;
            if child_game.apply_legal(mv) == MoveOutcome::AwaitingPromotion {
                child_game
                    .promote(PieceKind::Queen)
                    .expect("queen is a valid promotion kind");
                played.promotion = Some(PieceKind::Queen);
            }
            self.children.push((played, SearchNode::leaf(child_game)));
        }
    }

    /// Refresh this node's minimax value from its children: maximum child
    /// score when White is to move here, minimum for Black. The move
    /// producing the extremal score becomes the node's best move. A
    /// childless node keeps its static score.
    fn evaluate(&mut self) {
        if self.children.is_empty() {
            return;
        }
        let mut best = 0usize;
        let mut best_score = self.children[0].1.score;
        for (idx, (_, child)) in self.children.iter().enumerate().skip(1) {
            let better = match self.mover {
                Color::White => child.score > best_score,
                Color::Black => child.score < best_score,
            };
            if better {
                best = idx;
                best_score = child.score;
            }
        }
        self.best = Some(best);
        self.score = best_score;
    }

    /// The move this node currently considers best, if any.
    pub fn best_move(&self) -> Option<Move> {
        self.best.map(|idx| self.children[idx].0)
    }

    /// Current minimax score of this node.
    pub fn score(&self) -> i32 {
        self.score
    }

    /// One search iteration: follow best-move links to a leaf, expand it,
    /// and re-evaluate on the way back. Returns `false` when the best line
    /// bottoms out in an already-expanded terminal node — the caller must
    /// stop rather than re-select it forever.
    fn step(&mut self) -> bool {
        if !self.expanded {
            self.expand();
            self.evaluate();
            return true;
        }
        let Some(best) = self.best else {
            // Expanded but childless: terminal.
            return false;
        };
        let progressed = self.children[best].1.step();
        self.evaluate();
        progressed
    }
}

// =========================================================================
// SearchTree
// =========================================================================

/// A search tree rooted at a snapshot of the live game. Built fresh per AI
/// turn and discarded after the best move is extracted.
pub struct SearchTree {
    root: SearchNode,
}

impl SearchTree {
    pub fn new(game: Game) -> Self {
        SearchTree {
            root: SearchNode::leaf(game),
        }
    }

    /// Run up to `node_budget` expansion iterations.
    pub fn search(&mut self, node_budget: u32) {
        for _ in 0..node_budget {
            if !self.root.step() {
                break;
            }
        }
    }

    /// Best move found for the side to move at the root.
    pub fn best_move(&self) -> Option<Move> {
        self.root.best_move()
    }

    /// Minimax score of the root.
    pub fn score(&self) -> i32 {
        self.root.score()
    }
}

// =========================================================================
// Entry point
// =========================================================================

/// Select a move for the side to move by budgeted minimax expansion.
///
/// The returned move is always a member of the root position's legal-move
/// set for any `node_budget >= 1`.
pub fn ai_select_move(game: &Game, node_budget: u32) -> Result<Move, ChessError> {
    if game.is_over() {
        return Err(ChessError::GameOver(game.status()));
    }
    if let Some(sq) = game.pending_promotion() {
        return Err(ChessError::PromotionPending(sq));
    }
    let mut tree = SearchTree::new(game.clone());
    tree.search(node_budget.max(1));
    tree.best_move().ok_or(ChessError::GameOver(game.status()))
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::Position;
    use crate::engine::piece::Piece;
    use crate::engine::types::{GameStatus, PieceKind, Square};

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn play(game: &mut Game, from: &str, to: &str) {
        game.attempt_move(sq(from), sq(to)).unwrap();
    }

    #[test]
    fn returns_legal_move_for_any_budget() {
        let game = Game::new();
        let legal = game.all_legal_moves(Color::White);
        for budget in [1, 2, 5, 50] {
            let mv = ai_select_move(&game, budget).unwrap();
            assert!(
                legal.iter().any(|m| m.from == mv.from && m.to == mv.to),
                "budget {budget} produced illegal move {mv}"
            );
        }
    }

    #[test]
    fn captures_hanging_rook() {
        let mut pos = Position::with_kings(sq("e1"), sq("e8"));
        pos.place(Piece::new(PieceKind::Queen, Color::White, sq("d2")));
        pos.place(Piece::new(PieceKind::Rook, Color::Black, sq("d5")));
        let game = Game::from_position(pos, Color::White);

        let mv = ai_select_move(&game, 50).unwrap();
        assert_eq!(mv.to, sq("d5"), "should capture the hanging rook");
    }

    #[test]
    fn prefers_protected_mate_capture() {
        // Scholar's mate position: Qxf7 mates; every other queen capture
        // gets refuted once its reply is expanded.
        let mut game = Game::new();
        play(&mut game, "e2", "e4");
        play(&mut game, "e7", "e5");
        play(&mut game, "f1", "c4");
        play(&mut game, "b8", "c6");
        play(&mut game, "d1", "h5");
        play(&mut game, "g8", "f6");

        let mv = ai_select_move(&game, 200).unwrap();
        assert_eq!(mv.to, sq("f7"), "expected Qxf7");

        let mut probe = game.clone();
        probe.attempt_move(mv.from, mv.to).unwrap();
        assert_eq!(probe.status(), GameStatus::WhiteWins);
    }

    #[test]
    fn black_minimizes() {
        // Black queen can take a hanging white rook.
        let mut pos = Position::with_kings(sq("e1"), sq("e8"));
        pos.place(Piece::new(PieceKind::Queen, Color::Black, sq("d7")));
        pos.place(Piece::new(PieceKind::Rook, Color::White, sq("d4")));
        let game = Game::from_position(pos, Color::Black);

        let mv = ai_select_move(&game, 50).unwrap();
        assert_eq!(mv.to, sq("d4"));
    }

    #[test]
    fn search_promotes_to_queen() {
        let mut pos = Position::with_kings(sq("e1"), sq("h6"));
        pos.place(Piece::new(PieceKind::Pawn, Color::White, sq("a7")));
        let game = Game::from_position(pos, Color::White);

        let mv = ai_select_move(&game, 50).unwrap();
        // Promoting is worth +800; the engine should take it and queen.
        assert_eq!(mv.to, sq("a8"));
        assert_eq!(mv.promotion, Some(PieceKind::Queen));
    }

    #[test]
    fn terminal_position_errors() {
        // Fool's mate: game over, nothing to search.
        let mut game = Game::new();
        play(&mut game, "f2", "f3");
        play(&mut game, "e7", "e5");
        play(&mut game, "g2", "g4");
        play(&mut game, "d8", "h4");
        assert!(matches!(
            ai_select_move(&game, 10).unwrap_err(),
            ChessError::GameOver(GameStatus::BlackWins)
        ));
    }

    #[test]
    fn large_budget_terminates() {
        let mut pos = Position::with_kings(sq("e1"), sq("e8"));
        pos.place(Piece::new(PieceKind::Pawn, Color::White, sq("a2")));
        let game = Game::from_position(pos, Color::White);
        // Not asserting on the move itself — only that a large budget
        // returns promptly with something legal.
        let mv = ai_select_move(&game, 5_000).unwrap();
        assert!(game
            .all_legal_moves(Color::White)
            .iter()
            .any(|m| m.from == mv.from && m.to == mv.to));
    }

    #[test]
    fn budget_zero_is_treated_as_one() {
        let game = Game::new();
        let mv = ai_select_move(&game, 0).unwrap();
        assert!(game
            .all_legal_moves(Color::White)
            .iter()
            .any(|m| m.from == mv.from && m.to == mv.to));
    }

    #[test]
    fn tree_scores_track_material() {
        let mut pos = Position::with_kings(sq("e1"), sq("e8"));
        pos.place(Piece::new(PieceKind::Queen, Color::White, sq("d2")));
        pos.place(Piece::new(PieceKind::Rook, Color::Black, sq("d5")));
        let game = Game::from_position(pos, Color::White);

        let mut tree = SearchTree::new(game);
        tree.search(50);
        // After taking the rook White is up queen for nothing.
        assert!(tree.score() >= 400, "root score too low: {}", tree.score());
    }
}
