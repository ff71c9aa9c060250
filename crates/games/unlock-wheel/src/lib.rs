use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use unlock_core::completion::CompletionLatch;
use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{
    GameConfig, GameEvent, GameInput, GameMetadata, GamePhase, GameResult, UnlockGame,
};
use unlock_core::timers::TimerSet;
use unlock_core::unlock_game_boilerplate;

pub const DEFAULT_SEGMENTS: [&str; 4] = ["Yes", "Absolutely", "Obviously", "Of course"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WheelConfig {
    pub spin_ms: u64,
    /// Full rotations before the landing angle.
    pub turns: u32,
    pub segments: Vec<String>,
    pub seed: Option<u64>,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            spin_ms: 3000,
            turns: 5,
            segments: DEFAULT_SEGMENTS.iter().map(|s| s.to_string()).collect(),
            seed: None,
        }
    }
}

impl WheelConfig {
    pub fn from_game_config(config: &GameConfig) -> Self {
        let d = Self::default();
        let segments = config
            .read::<Vec<String>>(&["segments"])
            .map(|s| {
                s.into_iter()
                    .filter(|label| !label.trim().is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|s| !s.is_empty())
            .unwrap_or(d.segments);
        Self {
            spin_ms: config
                .u64_opt(&["spin_ms", "spinMs"])
                .filter(|ms| *ms > 0)
                .unwrap_or(d.spin_ms),
            turns: config.u32_or(&["turns"], d.turns).min(50),
            segments,
            seed: config.u64_opt(&["seed"]),
        }
    }

    fn spin_secs(&self) -> f32 {
        self.spin_ms as f32 / 1000.0
    }

    /// Arc covered by one segment, degrees.
    pub fn segment_arc(&self) -> f32 {
        360.0 / self.segments.len().max(1) as f32
    }

    /// Segment under the fixed pointer at 12 o'clock when the wheel has
    /// turned clockwise by `landing_deg` (mod 360).
    pub fn segment_at(&self, landing_deg: f32) -> usize {
        let under_pointer = (360.0 - landing_deg.rem_euclid(360.0)).rem_euclid(360.0);
        let idx = (under_pointer / self.segment_arc()) as usize;
        idx.min(self.segments.len().saturating_sub(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WheelTimer {
    SpinDone,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spin {
    pub landing_deg: f32,
    pub elapsed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WheelState {
    pub spin: Option<Spin>,
    pub landed: Option<usize>,
    pub phase: GamePhase,
    pub completion: CompletionLatch,
    pub timers: TimerSet<WheelTimer>,
}

impl WheelState {
    fn new() -> Self {
        Self {
            spin: None,
            landed: None,
            phase: GamePhase::Playing,
            completion: CompletionLatch::new(),
            timers: TimerSet::new(),
        }
    }
}

/// Tap to spin. Never fails; only the landing label varies.
pub struct WheelGame {
    config: WheelConfig,
    rng: StdRng,
    state: WheelState,
    paused: bool,
    torn_down: bool,
}

impl WheelGame {
    pub fn new() -> Self {
        Self {
            config: WheelConfig::default(),
            rng: StdRng::seed_from_u64(rand::random()),
            state: WheelState::new(),
            paused: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &WheelState {
        &self.state
    }

    pub fn config(&self) -> &WheelConfig {
        &self.config
    }

    /// Current wheel rotation in degrees, eased out over the spin.
    pub fn rotation_deg(&self) -> f32 {
        let Some(spin) = self.state.spin else {
            return 0.0;
        };
        let total = self.config.turns as f32 * 360.0 + spin.landing_deg;
        let u = (spin.elapsed / self.config.spin_secs()).clamp(0.0, 1.0);
        total * ease_out_cubic(u)
    }

    fn start_spin(&mut self) {
        let landing_deg = self.rng.random_range(0.0..360.0);
        self.state.spin = Some(Spin {
            landing_deg,
            elapsed: 0.0,
        });
        self.state
            .timers
            .schedule(WheelTimer::SpinDone, self.config.spin_secs());
        tracing::debug!(landing_deg, "Wheel spinning");
    }

    fn finish_spin(&mut self, events: &mut Vec<GameEvent>) {
        let Some(spin) = self.state.spin else {
            return;
        };
        let idx = self.config.segment_at(spin.landing_deg);
        let label = self
            .config
            .segments
            .get(idx)
            .cloned()
            .unwrap_or_else(|| DEFAULT_SEGMENTS[0].to_string());
        self.state.landed = Some(idx);
        self.state.phase = GamePhase::Solved;
        let result = GameResult::new(GameTypeId::Wheel, label)
            .with_meta("segment", idx)
            .with_meta("landing_deg", f64::from(spin.landing_deg.round()));
        events.push(GameEvent::Progress { fraction: 1.0 });
        events.extend(self.state.completion.fire(Some(result)));
    }
}

fn ease_out_cubic(u: f32) -> f32 {
    1.0 - (1.0 - u).powi(3)
}

impl Default for WheelGame {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockGame for WheelGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Wheel".to_string(),
            description: "Spin the wheel to open the invite.".to_string(),
            estimated_duration: Duration::from_secs(5),
        }
    }

    fn game_type(&self) -> GameTypeId {
        GameTypeId::Wheel
    }

    fn init(&mut self, config: &GameConfig) {
        self.config = WheelConfig::from_game_config(config);
        self.rng = StdRng::seed_from_u64(self.config.seed.unwrap_or_else(rand::random));
        self.state = WheelState::new();
        self.paused = false;
        self.torn_down = false;
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused {
            return Vec::new();
        }
        let mut events = Vec::new();
        if self.state.phase == GamePhase::Playing
            && let Some(spin) = self.state.spin.as_mut()
        {
            spin.elapsed = (spin.elapsed + dt).min(self.config.spin_secs());
            events.push(GameEvent::Progress {
                fraction: spin.elapsed / self.config.spin_secs(),
            });
        }
        for timer in self.state.timers.advance(dt) {
            match timer {
                WheelTimer::SpinDone => self.finish_spin(&mut events),
            }
        }
        events
    }

    fn apply_input(&mut self, input: &GameInput) -> Vec<GameEvent> {
        if self.paused || self.state.phase != GamePhase::Playing {
            return Vec::new();
        }
        if matches!(input, GameInput::Tap | GameInput::PointerDown { .. })
            && self.state.spin.is_none()
        {
            self.start_spin();
        }
        Vec::new()
    }

    unlock_game_boilerplate!(state_type: WheelState);
}
