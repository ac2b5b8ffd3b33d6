//! Engine configuration and shared constants

pub mod config;
pub mod constants;

pub use config::{DatabaseConfig, EngineConfig, FilterLimits, PaginationConfig, QueryBackend};
