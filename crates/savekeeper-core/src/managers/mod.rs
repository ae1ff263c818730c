//! Core managers for save state.
//!
//! These managers own the save subsystem's behavior without any
//! framework-specific dependencies. They can be used by:
//! - A game client holding one manager for the whole session
//! - The `savekeeper` CLI

pub mod save_manager;
pub mod scores;

pub use save_manager::{PersistHandle, SaveManager, DEFAULT_PROFILE_NAME};
pub use scores::ScoreAggregator;
