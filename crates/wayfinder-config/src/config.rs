//! Mapper settings, persisted as `config.ron`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Prefix that marks a user line as a special command.
pub const DEFAULT_COMMAND_PREFIX: char = '_';

/// ANSI sequence the game uses to colour room names (green).
pub const DEFAULT_ROOM_NAME_COLOR: &str = "\u{1b}[32m";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Text classification and special-command settings.
    pub parser: ParserConfig,
    /// Movement queue and offline emulation settings.
    pub movement: MovementConfig,
    /// Diagnostics.
    pub debug: DebugConfig,
}

/// Parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Character that introduces a locally handled command.
    pub command_prefix: char,
    /// ANSI colour prefix that marks a room name line.
    pub room_name_color: String,
    /// Narrative fragments meaning the server refused the last move.
    pub move_failure_patterns: Vec<String>,
}

/// Movement configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MovementConfig {
    /// Time to wait for a server confirmation before emulating a move locally.
    pub offline_retry_ms: u64,
    /// Upper bound on unconfirmed queued moves.
    pub max_pending_moves: usize,
    /// Start with the connection flagged offline.
    pub start_offline: bool,
}

/// Diagnostics settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            command_prefix: DEFAULT_COMMAND_PREFIX,
            room_name_color: DEFAULT_ROOM_NAME_COLOR.to_string(),
            move_failure_patterns: vec![
                "Alas, you cannot go that way...".to_string(),
                "You need to swim to go there.".to_string(),
                "seems to be closed.".to_string(),
            ],
        }
    }
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            offline_retry_ms: 1000,
            max_pending_moves: 16,
            start_offline: false,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl MovementConfig {
    /// Retry timeout as a [`Duration`].
    pub fn offline_retry(&self) -> Duration {
        Duration::from_millis(self.offline_retry_ms)
    }
}

/// Checks that `prefix` can introduce special commands.
pub fn validate_prefix(prefix: char) -> Result<(), ConfigError> {
    if prefix.is_ascii_punctuation() {
        Ok(())
    } else {
        Err(ConfigError::InvalidPrefix(prefix))
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Platform config directory (`<config_dir>/wayfinder`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("wayfinder"))
    }

    /// Rejects settings the core cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_prefix(self.parser.command_prefix)?;
        if self.movement.offline_retry_ms == 0 {
            return Err(ConfigError::InvalidRetryTimeout);
        }
        if self.movement.max_pending_moves == 0 {
            return Err(ConfigError::InvalidQueueDepth);
        }
        Ok(())
    }

    /// Reads `config.ron` from `config_dir`; writes and returns the defaults when it is missing.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Writes `config.ron` into `config_dir`, creating the directory if needed.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("command_prefix: '_'"));
        assert!(ron_str.contains("offline_retry_ms: 1000"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_missing_section_uses_default() {
        let config: Config = ron::from_str("(debug: (log_level: \"debug\"))").unwrap();
        assert_eq!(config.parser, ParserConfig::default());
        assert_eq!(config.movement, MovementConfig::default());
        assert_eq!(config.debug.log_level, "debug");
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_prefix_rejected() {
        let mut config = Config::default();
        config.parser.command_prefix = 'a';
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPrefix('a'))
        ));
        config.parser.command_prefix = ' ';
        assert!(config.validate().is_err());
        config.parser.command_prefix = '#';
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = Config::default();
        config.movement.offline_retry_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRetryTimeout)
        ));

        let mut config = Config::default();
        config.movement.max_pending_moves = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidQueueDepth)
        ));
    }

    #[test]
    fn test_offline_retry_duration() {
        let movement = MovementConfig {
            offline_retry_ms: 250,
            ..Default::default()
        };
        assert_eq!(movement.offline_retry(), Duration::from_millis(250));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.parser.command_prefix = '#';
        config.movement.max_pending_moves = 4;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(loaded, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
