use thiserror::Error;
use wayfinder_commands::RegistryError;
use wayfinder_config::ConfigError;

/// Errors that stop a session from starting.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("command registration failed: {0}")]
    Registry(#[from] RegistryError),
}
