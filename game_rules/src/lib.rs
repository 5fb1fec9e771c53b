//! # Game Rules
//!
//! The data half of the guarded narrative graph engine: the per-game
//! [`GameState`], the guard DSL and its evaluator, and the AWF action
//! vocabulary. Nothing in this crate knows about quest graphs.

pub mod actions;
pub mod game_state;
pub mod guards;

pub use actions::*;
pub use game_state::*;
pub use guards::*;
