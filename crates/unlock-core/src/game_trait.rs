use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::game_registry::GameTypeId;

/// Core trait that every unlock mini-game implements.
///
/// A game owns its interaction state and internal timers for as long as it
/// is mounted. The host feeds it frame ticks and player input; the game
/// reports back through [`GameEvent`]s. `GameEvent::Completed` is the
/// completion signal and is emitted at most once per instance.
pub trait UnlockGame: Send {
    /// Display metadata for the game picker.
    fn metadata(&self) -> GameMetadata;

    /// Which registry entry this implementation belongs to.
    fn game_type(&self) -> GameTypeId;

    /// Start a fresh run with the given configuration. Missing or malformed
    /// keys fall back to the game's defaults. Cancels any pending timers.
    fn init(&mut self, config: &GameConfig);

    /// Advance timers and animation by `dt` seconds.
    fn update(&mut self, dt: f32) -> Vec<GameEvent>;

    /// React to a single player input.
    fn apply_input(&mut self, input: &GameInput) -> Vec<GameEvent>;

    /// Current lifecycle phase.
    fn phase(&self) -> GamePhase;

    /// Whether `GameEvent::Completed` has already been emitted.
    fn has_completed(&self) -> bool;

    /// Number of timers still scheduled on this instance.
    fn pending_timers(&self) -> usize;

    /// Snapshot of the game state.
    fn serialize_state(&self) -> Vec<u8>;

    /// Restore a snapshot produced by `serialize_state`.
    fn apply_state(&mut self, state: &[u8]);

    /// Freeze timers and ignore input until `resume`.
    fn pause(&mut self);

    fn resume(&mut self);

    /// Cancel every pending timer and stop the frame simulation. Called when
    /// the instance is unmounted; only `init` brings it back.
    fn teardown(&mut self);

    /// Preferred frame rate in Hz.
    fn tick_rate(&self) -> f32 {
        60.0
    }
}

/// Metadata shown when a host picks a game for their invite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
    pub estimated_duration: Duration,
}

/// Lifecycle phase of a mounted game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Playing,
    /// Won. Further input is ignored.
    Solved,
    /// Out of attempts. Only a remount starts over.
    Exhausted,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

/// Player input, normalized from whatever surface hosts the game.
///
/// Pointer coordinates are in the game's own logical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameInput {
    Tap,
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    SliderChanged { value: f32 },
    Select { index: usize },
    Reset,
}

/// Events emitted by a game from `update` or `apply_input`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// Progress toward the win condition, 0.0..=1.0.
    Progress { fraction: f32 },
    /// Short transient message ("Miss!", "Try again").
    Feedback { message: String },
    AttemptsChanged { remaining: u32 },
    /// No attempts remain; the game will not complete on its own.
    Exhausted,
    /// A run ended in a collision.
    GameOver,
    /// The completion signal, carrying an optional result summary.
    Completed { result: Option<GameResult> },
}

impl GameEvent {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Structured outcome handed to the caller when a game completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameResult {
    pub game: GameTypeId,
    pub label: String,
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
    pub completed_at: DateTime<Utc>,
}

impl GameResult {
    pub fn new(game: GameTypeId, label: impl Into<String>) -> Self {
        Self {
            game,
            label: label.into(),
            meta: BTreeMap::new(),
            completed_at: crate::time::timestamp_now(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }
}

/// Per-game options, as stored on the invite record.
///
/// Lookups take a list of accepted key spellings so that records written
/// with camelCase keys (`holdMs`) keep working.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameConfig {
    pub custom: HashMap<String, Value>,
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an arbitrary JSON value. Anything but an object yields an
    /// empty config.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self {
                custom: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            },
            Value::Null => Self::default(),
            other => {
                tracing::debug!(value = %other, "Ignoring non-object game config");
                Self::default()
            },
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.custom.insert(key.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.custom.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.custom.get(key)
    }

    /// Layer `overrides` on top of `self`; keys in `overrides` win.
    pub fn merged(&self, overrides: &GameConfig) -> GameConfig {
        let mut custom = self.custom.clone();
        for (k, v) in &overrides.custom {
            custom.insert(k.clone(), v.clone());
        }
        GameConfig { custom }
    }

    /// Deserialize the first present key. A malformed value is logged and
    /// treated as absent.
    pub fn read<T: DeserializeOwned>(&self, keys: &[&str]) -> Option<T> {
        let (key, value) = keys
            .iter()
            .find_map(|k| self.custom.get(*k).map(|v| (*k, v)))?;
        match serde_json::from_value::<T>(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(key, error = %e, "Malformed game config value, using default");
                None
            },
        }
    }

    /// Numeric lookup that also accepts numeric strings. Non-finite values
    /// are rejected.
    pub fn number(&self, keys: &[&str]) -> Option<f64> {
        let (key, value) = keys
            .iter()
            .find_map(|k| self.custom.get(*k).map(|v| (*k, v)))?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(n) if n.is_finite() => Some(n),
            _ => {
                tracing::debug!(key, value = %value, "Malformed numeric game config value");
                None
            },
        }
    }

    pub fn f32_or(&self, keys: &[&str], default: f32) -> f32 {
        self.number(keys).map_or(default, |n| n as f32)
    }

    /// Non-negative integer lookup; fractional values are truncated.
    pub fn u32_or(&self, keys: &[&str], default: u32) -> u32 {
        match self.number(keys) {
            Some(n) if n >= 0.0 => n.min(u32::MAX as f64) as u32,
            _ => default,
        }
    }

    pub fn u64_opt(&self, keys: &[&str]) -> Option<u64> {
        self.number(keys)
            .filter(|n| *n >= 0.0)
            .map(|n| n.min(u64::MAX as f64) as u64)
    }
}

/// Generates the `UnlockGame` methods that are identical across all games:
/// `serialize_state`, `apply_state`, `pause`, `resume`, `phase`,
/// `has_completed`, `pending_timers`, `teardown`.
///
/// Requires the implementing struct to have `state: $StateType`,
/// `paused: bool` and `torn_down: bool` fields, and `$StateType` to have `phase: GamePhase`,
/// `completion: CompletionLatch`, and `timers: TimerSet<_>` fields.
#[macro_export]
macro_rules! unlock_game_boilerplate {
    (state_type: $StateType:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec(&self.state).unwrap_or_default()
        }

        fn apply_state(&mut self, state: &[u8]) {
            match rmp_serde::from_slice::<$StateType>(state) {
                Ok(s) => self.state = s,
                Err(e) => tracing::debug!(error = %e, "Dropped malformed state snapshot"),
            }
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            if !self.torn_down {
                self.paused = false;
            }
        }

        fn phase(&self) -> $crate::game_trait::GamePhase {
            self.state.phase
        }

        fn has_completed(&self) -> bool {
            self.state.completion.has_fired()
        }

        fn pending_timers(&self) -> usize {
            self.state.timers.len()
        }

        /// Cancels timers and freezes the instance. Per-frame simulation
        /// is gated on `paused`, which stays set until the next `init`.
        fn teardown(&mut self) {
            self.torn_down = true;
            self.paused = true;
            let cancelled = self.state.timers.cancel_all();
            if cancelled > 0 {
                tracing::debug!(game = %self.game_type(), cancelled, "Cancelled pending timers");
            }
        }
    };
}
