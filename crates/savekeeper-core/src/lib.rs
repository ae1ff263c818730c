//! # savekeeper-core
//!
//! Player progress persistence and leaderboard aggregation.
//!
//! This crate is framework-agnostic and can be used by:
//! - A game client (native or wasm) holding one `SaveManager`
//! - The `savekeeper` command line tool
//! - Tests driving an in-memory storage backend
//!
//! ## Key Concepts
//!
//! - **Profile**: A named, independently persisted `ProgressData` record
//! - **Metric**: The best/last recorded time for one level in one profile
//! - **Interaction gate**: A one-way latch some platforms require before the
//!   first durable write
//! - **Durability sync**: An explicit flush step some platforms require before
//!   a write is visible to later reads

pub mod config;
pub mod event_bus;
pub mod interaction;
pub mod logging;
pub mod managers;
pub mod paths;
pub mod persistence;

// Re-export commonly used types
pub use config::SaveConfig;
pub use event_bus::{SaveEvent, SaveEventBus};
pub use interaction::InteractionGate;
pub use logging::{LogSink, Severity};
pub use managers::{PersistHandle, SaveManager, ScoreAggregator};
pub use persistence::{ProgressData, ProgressMetric, Score};
