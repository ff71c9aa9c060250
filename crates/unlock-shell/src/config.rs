use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::GameConfig;

use crate::error::ConfigError;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "unlock.toml";

/// Top-level shell configuration, loaded from `unlock.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Frame rate of the session tick loop.
    pub tick_rate_hz: f32,
    /// Longest frame handed to a game in one update (seconds).
    pub max_frame_dt: f32,
    /// JSON file that keeps completed results across runs.
    pub results_path: Option<PathBuf>,
    pub log_format: LogFormat,
    /// Per-game option overrides, keyed by game id (`[games.pour]`).
    pub games: HashMap<String, HashMap<String, Value>>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60.0,
            max_frame_dt: 0.033,
            results_path: None,
            log_format: LogFormat::Pretty,
            games: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::invalid(
                "log_format",
                format!("expected \"pretty\" or \"json\", got {other:?}"),
            )),
        }
    }
}

impl ShellConfig {
    /// Load from `UNLOCK_CONFIG` (or `unlock.toml`), apply environment
    /// overrides, then validate.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("UNLOCK_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        let mut config = Self::load_file(&path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a config file. A missing file yields the defaults.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config = toml::from_str::<ShellConfig>(&content).map_err(|source| {
                    ConfigError::Parse {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                tracing::info!(path = %path.display(), "Loaded configuration");
                Ok(config)
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No config file found, using defaults");
                Ok(Self::default())
            },
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Apply `UNLOCK_*` overrides. `lookup` abstracts the environment so
    /// tests can supply their own.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(val) = get("UNLOCK_TICK_RATE") {
            self.tick_rate_hz = val.trim().parse().map_err(|_| {
                ConfigError::invalid("UNLOCK_TICK_RATE", format!("not a number: {val:?}"))
            })?;
        }
        if let Some(val) = get("UNLOCK_MAX_FRAME_DT") {
            self.max_frame_dt = val.trim().parse().map_err(|_| {
                ConfigError::invalid("UNLOCK_MAX_FRAME_DT", format!("not a number: {val:?}"))
            })?;
        }
        if let Some(val) = get("UNLOCK_RESULTS_PATH") {
            self.results_path = Some(PathBuf::from(val));
        }
        if let Some(val) = get("UNLOCK_LOG_FORMAT") {
            self.log_format = val.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tick_rate_hz > 0.0 && self.tick_rate_hz <= 240.0) {
            return Err(ConfigError::invalid(
                "tick_rate_hz",
                format!("must be in (0, 240], got {}", self.tick_rate_hz),
            ));
        }
        if !(self.max_frame_dt > 0.0 && self.max_frame_dt <= 1.0) {
            return Err(ConfigError::invalid(
                "max_frame_dt",
                format!("must be in (0, 1], got {}", self.max_frame_dt),
            ));
        }
        for key in self.games.keys() {
            if key.parse::<GameTypeId>().is_err() {
                return Err(ConfigError::invalid(
                    &format!("games.{key}"),
                    "not a known game type",
                ));
            }
        }
        Ok(())
    }

    /// Overrides from `[games.<id>]` for one game type; empty when absent.
    /// Tables may use any accepted spelling of the id.
    pub fn game_overrides(&self, id: GameTypeId) -> GameConfig {
        let mut config = GameConfig::new();
        for (key, table) in &self.games {
            if key.parse::<GameTypeId>().ok() == Some(id) {
                for (k, v) in table {
                    config = config.with(k, v.clone());
                }
            }
        }
        config
    }
}
