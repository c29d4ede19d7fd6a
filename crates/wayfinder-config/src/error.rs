//! Configuration error types.

/// Errors that can occur when loading, saving, parsing, or validating
/// configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize config to RON.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),

    /// The special-command prefix is not a single ASCII punctuation character.
    #[error("invalid command prefix {0:?}: must be ASCII punctuation")]
    InvalidPrefix(char),

    /// The offline retry timeout is zero.
    #[error("offline retry timeout must be at least 1 ms")]
    InvalidRetryTimeout,

    /// The pending-move queue depth is zero.
    #[error("max pending moves must be at least 1")]
    InvalidQueueDepth,
}
