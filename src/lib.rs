pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod models;
pub mod roster;
pub mod scoring;
pub mod workers;

pub use error::ScoringError;
pub use scoring::{Match, MatchConfig};
