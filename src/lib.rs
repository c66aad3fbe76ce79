// Core modules
pub mod api;
pub mod backtest;
pub mod config;
pub mod discovery;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod persistence;
pub mod risk;
pub mod session;
pub mod strategy;

// Re-export commonly used types
pub use api::MarketData;
pub use error::BotError;
pub use models::*;
pub use strategy::Strategy;

// Error handling
pub type Result<T> = std::result::Result<T, BotError>;
