pub mod engine;
pub mod evaluation;
pub mod tree;

pub use engine::{AiEngine, RandomAi, TreeSearchAi, default_engine};
pub use tree::{SearchTree, ai_select_move};
