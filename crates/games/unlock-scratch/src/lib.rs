pub mod cover;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use unlock_core::completion::CompletionLatch;
use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{
    GameConfig, GameEvent, GameInput, GameMetadata, GamePhase, GameResult, UnlockGame,
};
use unlock_core::timers::TimerSet;
use unlock_core::unlock_game_boilerplate;

use cover::CoverMask;

/// Lets the final stroke render before the completion signal (seconds).
const REVEAL_DELAY_SECS: f32 = 0.25;

/// Finest sampling grid spacing accepted from config.
const MIN_STRIDE: f32 = 1.0;
/// Upper bound on coverage samples per card.
pub const MAX_SAMPLES: f64 = (1u32 << 20) as f64;

/// Tunable options, read from the invite's game config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScratchConfig {
    pub brush_radius: f32,
    /// Cleared fraction that reveals the card.
    pub threshold: f32,
    /// Spacing of the coverage sampling grid.
    pub stride: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            brush_radius: 18.0,
            threshold: 0.65,
            stride: 8.0,
            width: 320.0,
            height: 200.0,
        }
    }
}

impl ScratchConfig {
    pub fn from_game_config(config: &GameConfig) -> Self {
        let d = Self::default();
        let positive = |keys: &[&str], fallback: f32| {
            let v = config.f32_or(keys, fallback);
            if v > 0.0 { v } else { fallback }
        };
        let mut stride = positive(&["stride"], d.stride).max(MIN_STRIDE);
        let mut width = positive(&["width"], d.width);
        let mut height = positive(&["height"], d.height);
        if CoverMask::sample_count(width, height, stride) > MAX_SAMPLES {
            tracing::debug!(width, height, stride, "Scratch grid too large, using default size");
            (stride, width, height) = (d.stride, d.width, d.height);
        }
        Self {
            brush_radius: positive(&["brush_radius", "brushRadius"], d.brush_radius),
            threshold: config
                .f32_or(&["threshold"], d.threshold)
                .clamp(0.01, 1.0),
            stride,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScratchTimer {
    Reveal,
}

/// Serializable game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScratchState {
    pub cover: CoverMask,
    /// Last pointer position of the stroke in progress.
    pub last_point: Option<(f32, f32)>,
    /// A coverage check is due on the next frame.
    pub check_pending: bool,
    pub progress: f32,
    pub phase: GamePhase,
    pub completion: CompletionLatch,
    pub timers: TimerSet<ScratchTimer>,
}

impl ScratchState {
    fn new(config: &ScratchConfig) -> Self {
        Self {
            cover: CoverMask::new(config.width, config.height, config.stride),
            last_point: None,
            check_pending: false,
            progress: 0.0,
            phase: GamePhase::Playing,
            completion: CompletionLatch::new(),
            timers: TimerSet::new(),
        }
    }
}

/// Scratch away a cover card until enough of it is gone.
pub struct ScratchGame {
    config: ScratchConfig,
    state: ScratchState,
    paused: bool,
    torn_down: bool,
}

impl ScratchGame {
    pub fn new() -> Self {
        let config = ScratchConfig::default();
        Self {
            state: ScratchState::new(&config),
            config,
            paused: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &ScratchState {
        &self.state
    }

    pub fn config(&self) -> &ScratchConfig {
        &self.config
    }

    /// Measure coverage at most once per frame.
    fn check_progress(&mut self, events: &mut Vec<GameEvent>) {
        self.state.check_pending = false;
        let fraction = self.state.cover.cleared_fraction();
        self.state.progress = fraction;
        events.push(GameEvent::Progress { fraction });

        if self.state.phase == GamePhase::Playing && fraction >= self.config.threshold {
            self.state.phase = GamePhase::Solved;
            self.state.last_point = None;
            self.state
                .timers
                .schedule(ScratchTimer::Reveal, REVEAL_DELAY_SECS);
            tracing::debug!(fraction, "Scratch card revealed");
        }
    }
}

impl Default for ScratchGame {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockGame for ScratchGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Scratch".to_string(),
            description: "Scratch away the cover to reveal dinner.".to_string(),
            estimated_duration: Duration::from_secs(15),
        }
    }

    fn game_type(&self) -> GameTypeId {
        GameTypeId::Scratch
    }

    fn init(&mut self, config: &GameConfig) {
        self.config = ScratchConfig::from_game_config(config);
        self.state = ScratchState::new(&self.config);
        self.paused = false;
        self.torn_down = false;
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused {
            return Vec::new();
        }
        let mut events = Vec::new();
        if self.state.check_pending {
            self.check_progress(&mut events);
        }
        for timer in self.state.timers.advance(dt) {
            match timer {
                ScratchTimer::Reveal => {
                    let result = GameResult::new(GameTypeId::Scratch, "Dinner awaits.")
                        .with_meta("cleared_pct", (self.state.progress * 100.0).round());
                    events.extend(self.state.completion.fire(Some(result)));
                },
            }
        }
        events
    }

    fn apply_input(&mut self, input: &GameInput) -> Vec<GameEvent> {
        if self.paused || self.state.phase != GamePhase::Playing {
            return Vec::new();
        }
        let radius = self.config.brush_radius;
        match *input {
            GameInput::PointerDown { x, y } => {
                self.state.cover.dab(x, y, radius);
                self.state.last_point = Some((x, y));
                self.state.check_pending = true;
            },
            GameInput::PointerMove { x, y } => {
                if let Some((lx, ly)) = self.state.last_point {
                    self.state.cover.stroke(lx, ly, x, y, radius);
                    self.state.last_point = Some((x, y));
                    self.state.check_pending = true;
                }
            },
            GameInput::PointerUp => {
                self.state.last_point = None;
                self.state.check_pending = true;
            },
            _ => {},
        }
        Vec::new()
    }

    unlock_game_boilerplate!(state_type: ScratchState);
}
