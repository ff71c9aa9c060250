pub mod scoring;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use unlock_core::completion::CompletionLatch;
use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{
    GameConfig, GameEvent, GameInput, GameMetadata, GamePhase, GameResult, UnlockGame,
};
use unlock_core::timers::TimerSet;
use unlock_core::unlock_game_boilerplate;

use scoring::{band_from_fractions, grade_pour};

pub const MAX_FILL: f32 = 100.0;
const TOAST_SECS: f32 = 0.9;

/// Tunable options, read from the invite's game config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PourConfig {
    /// Target fill level, percent.
    pub target: f32,
    /// Half-width of the accepted band, percentage points.
    pub tolerance: f32,
    /// Percent per second while held.
    pub fill_rate: f32,
    /// Percent per second while released. Zero means the level just stops.
    pub drain_rate: f32,
}

impl Default for PourConfig {
    fn default() -> Self {
        Self {
            target: 75.0,
            tolerance: 4.0,
            fill_rate: 50.0,
            drain_rate: 0.0,
        }
    }
}

impl PourConfig {
    pub fn from_game_config(config: &GameConfig) -> Self {
        let d = Self::default();
        let (mut target, mut tolerance) = (d.target, d.tolerance);

        // Older invites store the band as fractions
        if let (Some(min), Some(max)) = (config.number(&["min"]), config.number(&["max"])) {
            (target, tolerance) = band_from_fractions(min as f32, max as f32);
        }
        if config.get("target").is_some() {
            target = config.f32_or(&["target"], target);
            tolerance = config.f32_or(&["tolerance"], d.tolerance);
        } else {
            tolerance = config.f32_or(&["tolerance"], tolerance);
        }

        Self {
            target: target.clamp(0.0, MAX_FILL),
            tolerance: tolerance.clamp(0.0, MAX_FILL),
            fill_rate: {
                let v = config.f32_or(&["fill_rate", "fillRate"], d.fill_rate);
                if v > 0.0 { v } else { d.fill_rate }
            },
            drain_rate: config
                .f32_or(&["drain_rate", "drainRate"], d.drain_rate)
                .max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PourTimer {
    ToastClear,
}

/// Serializable game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PourState {
    pub fill: f32,
    pub pouring: bool,
    /// Number of released pours, successful or not.
    pub pours: u32,
    pub toast: Option<String>,
    pub phase: GamePhase,
    pub completion: CompletionLatch,
    pub timers: TimerSet<PourTimer>,
}

impl PourState {
    fn new() -> Self {
        Self {
            fill: 0.0,
            pouring: false,
            pours: 0,
            toast: None,
            phase: GamePhase::Playing,
            completion: CompletionLatch::new(),
            timers: TimerSet::new(),
        }
    }
}

/// Hold to pour, release on the line.
pub struct PourGame {
    config: PourConfig,
    state: PourState,
    paused: bool,
    torn_down: bool,
}

impl PourGame {
    pub fn new() -> Self {
        Self {
            config: PourConfig::default(),
            state: PourState::new(),
            paused: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &PourState {
        &self.state
    }

    pub fn config(&self) -> &PourConfig {
        &self.config
    }

    fn release(&mut self) -> Vec<GameEvent> {
        self.state.pouring = false;
        self.state.pours += 1;
        let fill = self.state.fill;
        let grade = grade_pour(fill, self.config.target, self.config.tolerance);
        let mut events = Vec::new();

        if grade.within {
            self.state.phase = GamePhase::Solved;
            self.state.timers.cancel(PourTimer::ToastClear);
            self.state.toast = None;
            tracing::debug!(fill, error = grade.error, "Pour landed in band");
            let result = GameResult::new(GameTypeId::Pour, "Split the G")
                .with_meta("grade", grade.label())
                .with_meta("error_pct", round1(grade.error))
                .with_meta("under_over", grade.side.as_str())
                .with_meta("fill_pct", round1(fill));
            events.extend(self.state.completion.fire(Some(result)));
        } else {
            tracing::trace!(fill, error = grade.error, "Pour missed the band");
            self.state.fill = 0.0;
            self.state.toast = Some("Try again".to_string());
            self.state.timers.schedule(PourTimer::ToastClear, TOAST_SECS);
            events.push(GameEvent::Feedback {
                message: "Try again".to_string(),
            });
            events.push(GameEvent::Progress { fraction: 0.0 });
        }
        events
    }
}

fn round1(v: f32) -> f64 {
    (f64::from(v) * 10.0).round() / 10.0
}

impl Default for PourGame {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockGame for PourGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Split the G".to_string(),
            description: "Hold to pour and let go right on the line.".to_string(),
            estimated_duration: Duration::from_secs(10),
        }
    }

    fn game_type(&self) -> GameTypeId {
        GameTypeId::Pour
    }

    fn init(&mut self, config: &GameConfig) {
        self.config = PourConfig::from_game_config(config);
        self.state = PourState::new();
        self.paused = false;
        self.torn_down = false;
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused {
            return Vec::new();
        }
        let mut events = Vec::new();
        if self.state.phase == GamePhase::Playing {
            let before = self.state.fill;
            if self.state.pouring {
                self.state.fill = (before + self.config.fill_rate * dt).min(MAX_FILL);
            } else if self.config.drain_rate > 0.0 {
                self.state.fill = (before - self.config.drain_rate * dt).max(0.0);
            }
            if self.state.fill != before {
                events.push(GameEvent::Progress {
                    fraction: self.state.fill / MAX_FILL,
                });
            }
        }
        for timer in self.state.timers.advance(dt) {
            match timer {
                PourTimer::ToastClear => self.state.toast = None,
            }
        }
        events
    }

    fn apply_input(&mut self, input: &GameInput) -> Vec<GameEvent> {
        if self.paused || self.state.phase != GamePhase::Playing {
            return Vec::new();
        }
        match input {
            GameInput::PointerDown { .. } => {
                self.state.pouring = true;
                Vec::new()
            },
            GameInput::PointerUp if self.state.pouring => self.release(),
            GameInput::Reset => {
                self.state.pouring = false;
                self.state.fill = 0.0;
                vec![GameEvent::Progress { fraction: 0.0 }]
            },
            _ => Vec::new(),
        }
    }

    unlock_game_boilerplate!(state_type: PourState);
}
