//! # Narrative Core
//!
//! The guarded narrative graph engine. Works over plain data from
//! `game_rules` and a [`QuestGraph`] loaded by the caller; performs no I/O.
//!
//! ## Core Components
//!
//! - **quest_graph**: Nodes, guarded edges and load-time validation
//! - **engine**: Active node selection, frontier and outcome folding
//! - **stuck**: Heuristic stuck detection over recent turns
//! - **slice**: Active node + frontier + fingerprint for the next prompt
//! - **turn**: One full engine pass per turn
//!
//! ## Concurrency
//!
//! Every entry point is a pure, synchronous function. Turns for the same game
//! must be serialized by the caller; separate games are fully independent.

pub mod config;
pub mod engine;
pub mod error;
pub mod hash;
pub mod quest_graph;
pub mod slice;
pub mod stuck;
pub mod turn;

pub use config::*;
pub use engine::*;
pub use error::*;
pub use hash::*;
pub use quest_graph::*;
pub use slice::*;
pub use stuck::*;
pub use turn::*;
