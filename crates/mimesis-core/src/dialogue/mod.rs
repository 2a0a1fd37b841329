//! Multi-persona conversation module.
//!
//! # Module Structure
//!
//! - `turns`: Round-robin turn scheduler
//! - `elimination`: Rock-paper-scissors round deciding who speaks
//!
//! # Usage
//!
//! ```ignore
//! use mimesis_core::dialogue::{EliminationGame, TurnScheduler};
//! ```

pub mod elimination;
pub mod turns;

// Re-export public API
pub use elimination::{decide, EliminationGame, EliminationResult, Hand};
pub use turns::TurnScheduler;
