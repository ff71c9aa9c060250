use std::path::PathBuf;

use thiserror::Error;

use unlock_core::game_registry::UnknownGameType;

/// Problems with `unlock.toml` or the environment overrides.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failures reading or writing the result file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result store I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("result store file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode results: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Top-level error for the shell binary and session host.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    UnknownGame(#[from] UnknownGameType),
    #[error("invalid game config JSON: {0}")]
    GameConfig(#[source] serde_json::Error),
    #[error("bad input line {line}: {source}")]
    Input {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode output: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("usage: {0}")]
    Usage(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session {0} is not running")]
    SessionClosed(uuid::Uuid),
}
