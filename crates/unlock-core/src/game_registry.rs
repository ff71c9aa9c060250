use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Identifier for a registered mini-game type.
///
/// The set is closed: adding a game means adding a variant here and an entry
/// in the shell registry. `Fishing` is the designated fallback for unknown or
/// missing identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameTypeId {
    #[default]
    Fishing,
    Scratch,
    Pour,
    Lockpick,
    Wheel,
    Runner,
    Memory,
}

/// Returned by [`GameTypeId::from_str`] for identifiers outside the known set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game type {0:?}")]
pub struct UnknownGameType(pub String);

impl GameTypeId {
    /// Every game type, in registry declaration order.
    pub const ALL: [GameTypeId; 7] = [
        GameTypeId::Fishing,
        GameTypeId::Scratch,
        GameTypeId::Pour,
        GameTypeId::Lockpick,
        GameTypeId::Wheel,
        GameTypeId::Runner,
        GameTypeId::Memory,
    ];

    /// Stable snake-case id, as stored on invite records.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fishing => "fishing",
            Self::Scratch => "scratch",
            Self::Pour => "pour",
            Self::Lockpick => "lockpick",
            Self::Wheel => "wheel",
            Self::Runner => "runner",
            Self::Memory => "memory",
        }
    }

    /// Position of this id in [`GameTypeId::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lenient resolution used by the recipient flow: an absent or unknown
    /// identifier resolves to the default game instead of failing.
    pub fn resolve(raw: Option<&str>) -> Self {
        match raw {
            Some(s) => s.parse().unwrap_or_else(|e: UnknownGameType| {
                tracing::debug!(error = %e, "Falling back to default game type");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

impl FromStr for GameTypeId {
    type Err = UnknownGameType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fishing" => Ok(Self::Fishing),
            "scratch" => Ok(Self::Scratch),
            "pour" | "split-the-g" => Ok(Self::Pour),
            "lockpick" => Ok(Self::Lockpick),
            "wheel" => Ok(Self::Wheel),
            "runner" | "dino" | "dino-runner" | "dino_runner" => Ok(Self::Runner),
            "memory" => Ok(Self::Memory),
            _ => Err(UnknownGameType(s.to_string())),
        }
    }
}

impl fmt::Display for GameTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for GameTypeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::resolve(raw.as_deref()))
    }
}
