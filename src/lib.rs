pub mod cache;
pub mod commands;
pub mod config;
pub mod data_provider;
pub mod dev;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod formatting;
pub mod match_state;
pub mod reconcile;
pub mod scheduler;
pub mod search;
pub mod snapshot;
pub mod standings;
pub mod types;

pub use engine::Engine;
pub use error::{EngineError, EngineResult};
