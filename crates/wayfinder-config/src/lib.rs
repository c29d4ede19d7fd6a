//! Configuration system for Wayfinder.
//!
//! Provides runtime-configurable settings that persist to disk as RON files.
//! Supports CLI overrides via clap and forward/backward compatible
//! serialization.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DEFAULT_COMMAND_PREFIX, DEFAULT_ROOM_NAME_COLOR, DebugConfig, MovementConfig,
    ParserConfig, validate_prefix,
};
pub use error::ConfigError;
