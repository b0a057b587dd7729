//! gambit — a chess rules engine and move-search AI.
//!
//! The `engine` module owns the position model, move generation, legality
//! filtering, and game-state machine. The `ai` module builds a search tree
//! on top of a cloned [`engine::Game`] and selects moves for the computer
//! side. Rendering, input devices, and the turn loop belong to the caller.

pub mod ai;
pub mod config;
pub mod engine;
