//! trivia-common — Shared types, errors, and configuration used across all trivia crates.

pub mod error;
pub mod config;
pub mod models;

// Re-export commonly used types
pub use config::{RelayConfig, Settings};
pub use error::{ConfigError, RelayError};
pub use models::{ModelList, ModelProfile};
