pub mod board;
pub mod game;
pub mod notation;
pub mod piece;
pub mod types;

pub use board::Position;
pub use game::{Game, MoveOutcome, PieceView};
pub use notation::parse_move;
pub use piece::Piece;
pub use types::*;
