//! AI engine — trait definition, RandomAi, and TreeSearchAi.
//!
//! The `AiEngine` trait defines the interface the turn loop drives. Two
//! implementations are provided:
//!   - `RandomAi`     — plays a uniformly random legal move.
//!   - `TreeSearchAi` — budgeted minimax tree search (the default).

use rand::seq::SliceRandom;

use crate::ai::tree::ai_select_move;
use crate::engine::game::Game;
use crate::engine::types::{ChessError, Move};

/// Default expansion budget for [`TreeSearchAi`].
pub const DEFAULT_NODE_BUDGET: u32 = 600;

// =========================================================================
// AiEngine trait
// =========================================================================

/// The AI engine interface.
pub trait AiEngine: Send + Sync {
    /// Select a move for the side to move in the given game.
    fn select_move(&self, game: &Game) -> Result<Move, ChessError>;

    /// Human-readable name for this engine.
    fn name(&self) -> &str;
}

// =========================================================================
// RandomAi
// =========================================================================

/// Picks a random legal move.
pub struct RandomAi;

impl AiEngine for RandomAi {
    fn select_move(&self, game: &Game) -> Result<Move, ChessError> {
        if game.is_over() {
            return Err(ChessError::GameOver(game.status()));
        }
        let moves = game.all_legal_moves(game.turn());
        let mut rng = rand::thread_rng();
        moves
            .choose(&mut rng)
            .copied()
            .ok_or(ChessError::GameOver(game.status()))
    }

    fn name(&self) -> &str {
        "RandomAi"
    }
}

// =========================================================================
// TreeSearchAi
// =========================================================================

/// Minimax tree-search engine with a fixed per-move expansion budget.
pub struct TreeSearchAi {
    node_budget: u32,
}

impl TreeSearchAi {
    pub fn new(node_budget: u32) -> Self {
        Self { node_budget }
    }

    pub fn node_budget(&self) -> u32 {
        self.node_budget
    }
}

impl Default for TreeSearchAi {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_BUDGET)
    }
}

impl AiEngine for TreeSearchAi {
    fn select_move(&self, game: &Game) -> Result<Move, ChessError> {
        let mv = ai_select_move(game, self.node_budget)?;
        tracing::debug!(%mv, budget = self.node_budget, "tree search selected move");
        Ok(mv)
    }

    fn name(&self) -> &str {
        "TreeSearchAi"
    }
}

/// Convenience: create the default AI engine.
pub fn default_engine() -> TreeSearchAi {
    TreeSearchAi::default()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{Color, GameStatus, Square};

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    fn fools_mate() -> Game {
        let mut game = Game::new();
        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            game.attempt_move(sq(from), sq(to)).unwrap();
        }
        game
    }

    // --- RandomAi ---

    #[test]
    fn random_ai_returns_legal_move() {
        let game = Game::new();
        let ai = RandomAi;
        for _ in 0..50 {
            let mv = ai.select_move(&game).unwrap();
            let legal = game.all_legal_moves(Color::White);
            assert!(
                legal.iter().any(|m| m.from == mv.from && m.to == mv.to),
                "RandomAi returned illegal move: {mv}"
            );
        }
    }

    #[test]
    fn random_ai_errors_when_game_over() {
        let game = fools_mate();
        assert!(matches!(
            RandomAi.select_move(&game).unwrap_err(),
            ChessError::GameOver(GameStatus::BlackWins)
        ));
    }

    // --- TreeSearchAi ---

    #[test]
    fn tree_search_returns_legal_move() {
        let game = Game::new();
        let ai = TreeSearchAi::new(20);
        let mv = ai.select_move(&game).unwrap();
        let legal = game.all_legal_moves(Color::White);
        assert!(legal.iter().any(|m| m.from == mv.from && m.to == mv.to));
    }

    #[test]
    fn tree_search_errors_when_game_over() {
        let game = fools_mate();
        let ai = TreeSearchAi::default();
        assert!(ai.select_move(&game).is_err());
    }

    #[test]
    fn default_engine_uses_default_budget() {
        let engine = default_engine();
        assert_eq!(engine.name(), "TreeSearchAi");
        assert_eq!(engine.node_budget(), DEFAULT_NODE_BUDGET);
    }

    #[test]
    fn engines_are_trait_objects() {
        let engines: Vec<Box<dyn AiEngine>> =
            vec![Box::new(RandomAi), Box::new(TreeSearchAi::new(10))];
        let game = Game::new();
        for engine in &engines {
            assert!(engine.select_move(&game).is_ok(), "{} failed", engine.name());
        }
    }
}
