//! Command-line argument parsing for Wayfinder.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Wayfinder command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug)]
#[command(name = "wayfinder", about = "Replay a MUD session through the mapper core")]
pub struct CliArgs {
    /// Session transcript to replay. Lines starting with `> ` are user input,
    /// `@wait <ms>`, `@offline` and `@online` are replay directives, and
    /// everything else is server text.
    pub transcript: PathBuf,

    /// Map file (RON room list) used to resolve rooms.
    #[arg(long)]
    pub map: Option<PathBuf>,

    /// Special-command prefix character.
    #[arg(long)]
    pub prefix: Option<char>,

    /// Start with the connection flagged offline.
    #[arg(long)]
    pub offline: bool,

    /// Offline retry timeout in milliseconds.
    #[arg(long)]
    pub retry_ms: Option<u64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(prefix) = args.prefix {
            self.parser.command_prefix = prefix;
        }
        if args.offline {
            self.movement.start_offline = true;
        }
        if let Some(ms) = args.retry_ms {
            self.movement.offline_retry_ms = ms;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
