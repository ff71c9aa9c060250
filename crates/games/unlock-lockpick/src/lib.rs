use std::time::Duration;

use serde::{Deserialize, Serialize};

use unlock_core::completion::CompletionLatch;
use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{
    GameConfig, GameEvent, GameInput, GameMetadata, GamePhase, GameResult, UnlockGame,
};
use unlock_core::timers::TimerSet;
use unlock_core::unlock_game_boilerplate;

pub const SLIDER_MIN: f32 = 0.0;
pub const SLIDER_MAX: f32 = 100.0;
pub const SLIDER_START: f32 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockpickConfig {
    pub band_min: f32,
    pub band_max: f32,
    /// Continuous in-band hold needed to open the lock (milliseconds).
    pub hold_ms: u64,
}

impl Default for LockpickConfig {
    fn default() -> Self {
        Self {
            band_min: 42.0,
            band_max: 58.0,
            hold_ms: 900,
        }
    }
}

impl LockpickConfig {
    pub fn from_game_config(config: &GameConfig) -> Self {
        let d = Self::default();
        let a = config
            .f32_or(&["band_min", "bandMin"], d.band_min)
            .clamp(SLIDER_MIN, SLIDER_MAX);
        let b = config
            .f32_or(&["band_max", "bandMax"], d.band_max)
            .clamp(SLIDER_MIN, SLIDER_MAX);
        Self {
            band_min: a.min(b),
            band_max: a.max(b),
            hold_ms: config
                .u64_opt(&["hold_ms", "holdMs"])
                .filter(|ms| *ms > 0)
                .unwrap_or(d.hold_ms),
        }
    }

    pub fn in_band(&self, value: f32) -> bool {
        (self.band_min..=self.band_max).contains(&value)
    }

    fn hold_secs(&self) -> f32 {
        self.hold_ms as f32 / 1000.0
    }
}

/// The lock has no delayed actions of its own; the set stays empty so the
/// shared lifecycle plumbing applies unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockpickTimer {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockpickState {
    pub value: f32,
    pub holding: bool,
    /// Seconds spent continuously held inside the band.
    pub held_secs: f32,
    pub phase: GamePhase,
    pub completion: CompletionLatch,
    pub timers: TimerSet<LockpickTimer>,
}

impl LockpickState {
    fn new() -> Self {
        Self {
            value: SLIDER_START,
            holding: false,
            held_secs: 0.0,
            phase: GamePhase::Playing,
            completion: CompletionLatch::new(),
            timers: TimerSet::new(),
        }
    }
}

pub struct LockpickGame {
    config: LockpickConfig,
    state: LockpickState,
    paused: bool,
    torn_down: bool,
}

impl LockpickGame {
    pub fn new() -> Self {
        Self {
            config: LockpickConfig::default(),
            state: LockpickState::new(),
            paused: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &LockpickState {
        &self.state
    }

    pub fn config(&self) -> &LockpickConfig {
        &self.config
    }

    /// Hold progress toward opening, 0.0..=1.0.
    pub fn progress(&self) -> f32 {
        (self.state.held_secs / self.config.hold_secs()).min(1.0)
    }

    fn reset_progress(&mut self, events: &mut Vec<GameEvent>) {
        if self.state.held_secs > 0.0 {
            tracing::trace!(value = self.state.value, "Lockpick hold broken");
            self.state.held_secs = 0.0;
            events.push(GameEvent::Progress { fraction: 0.0 });
        }
    }
}

impl Default for LockpickGame {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockGame for LockpickGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Lockpick".to_string(),
            description: "Hold the slider in the sweet spot.".to_string(),
            estimated_duration: Duration::from_secs(10),
        }
    }

    fn game_type(&self) -> GameTypeId {
        GameTypeId::Lockpick
    }

    fn init(&mut self, config: &GameConfig) {
        self.config = LockpickConfig::from_game_config(config);
        self.state = LockpickState::new();
        self.paused = false;
        self.torn_down = false;
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused || self.state.phase != GamePhase::Playing {
            return Vec::new();
        }
        let mut events = Vec::new();
        if !self.state.holding || !self.config.in_band(self.state.value) {
            self.reset_progress(&mut events);
            return events;
        }

        self.state.held_secs += dt;
        events.push(GameEvent::Progress {
            fraction: self.progress(),
        });
        if self.state.held_secs >= self.config.hold_secs() {
            self.state.phase = GamePhase::Solved;
            self.state.holding = false;
            tracing::debug!(value = self.state.value, "Lock opened");
            let result = GameResult::new(GameTypeId::Lockpick, "Unlocked")
                .with_meta("value", self.state.value)
                .with_meta("hold_ms", self.config.hold_ms);
            events.extend(self.state.completion.fire(Some(result)));
        }
        events
    }

    fn apply_input(&mut self, input: &GameInput) -> Vec<GameEvent> {
        if self.paused || self.state.phase != GamePhase::Playing {
            return Vec::new();
        }
        let mut events = Vec::new();
        match *input {
            GameInput::PointerDown { .. } => self.state.holding = true,
            GameInput::PointerUp => {
                self.state.holding = false;
                self.reset_progress(&mut events);
            },
            GameInput::SliderChanged { value } => {
                if value.is_finite() {
                    self.state.value = value.clamp(SLIDER_MIN, SLIDER_MAX);
                }
                if !self.config.in_band(self.state.value) {
                    self.reset_progress(&mut events);
                }
            },
            GameInput::Reset => {
                self.state.value = SLIDER_START;
                self.state.holding = false;
                self.reset_progress(&mut events);
            },
            _ => {},
        }
        events
    }

    unlock_game_boilerplate!(state_type: LockpickState);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use unlock_core::test_helpers::{self, config, count_completions, run_ticks};

    const DT: f32 = 1.0 / 60.0;

    fn game_with(cfg: &GameConfig) -> LockpickGame {
        let mut game = LockpickGame::new();
        game.init(cfg);
        game
    }

    fn press(game: &mut LockpickGame) {
        game.apply_input(&GameInput::PointerDown { x: 0.0, y: 0.0 });
    }

    fn slide(game: &mut LockpickGame, value: f32) -> Vec<GameEvent> {
        game.apply_input(&GameInput::SliderChanged { value })
    }

    #[test]
    fn accepts_camel_case_hold() {
        let game = game_with(&config(&[("holdMs", json!(1500))]));
        assert_eq!(game.config.hold_ms, 1500);
        let game = game_with(&config(&[("holdMs", json!(0))]));
        assert_eq!(game.config.hold_ms, 900);
    }

    #[test]
    fn band_bounds_are_ordered() {
        let game = game_with(&config(&[("band_min", json!(70)), ("band_max", json!(30))]));
        assert_eq!(game.config.band_min, 30.0);
        assert_eq!(game.config.band_max, 70.0);
    }

    #[test]
    fn holding_in_band_opens_lock() {
        let mut game = game_with(&GameConfig::new());
        press(&mut game);
        slide(&mut game, 45.0);
        // 0.9 s at 60 Hz is 54 frames
        let early = run_ticks(&mut game, 50, DT);
        assert_eq!(count_completions(&early), 0);
        let events = run_ticks(&mut game, 10, DT);
        assert_eq!(count_completions(&events), 1);
        assert_eq!(game.state.phase, GamePhase::Solved);
    }

    #[test]
    fn leaving_band_resets_progress() {
        let mut game = game_with(&GameConfig::new());
        press(&mut game);
        run_ticks(&mut game, 40, DT);
        assert!(game.progress() > 0.5);

        let events = slide(&mut game, 70.0);
        assert_eq!(game.state.held_secs, 0.0);
        assert!(events.contains(&GameEvent::Progress { fraction: 0.0 }));

        // Back in band: the full hold is needed again
        slide(&mut game, 50.0);
        let events = run_ticks(&mut game, 40, DT);
        assert_eq!(count_completions(&events), 0);
        let events = run_ticks(&mut game, 20, DT);
        assert_eq!(count_completions(&events), 1);
    }

    #[test]
    fn out_of_band_never_accumulates() {
        let mut game = game_with(&GameConfig::new());
        press(&mut game);
        slide(&mut game, 10.0);
        let events = run_ticks(&mut game, 600, DT);
        assert_eq!(count_completions(&events), 0);
        assert_eq!(game.state.held_secs, 0.0);
    }

    #[test]
    fn releasing_resets_progress() {
        let mut game = game_with(&GameConfig::new());
        press(&mut game);
        run_ticks(&mut game, 30, DT);
        game.apply_input(&GameInput::PointerUp);
        assert_eq!(game.state.held_secs, 0.0);
        let events = run_ticks(&mut game, 120, DT);
        assert_eq!(count_completions(&events), 0);
    }

    #[test]
    fn band_edges_count_as_inside() {
        let mut game = game_with(&GameConfig::new());
        press(&mut game);
        slide(&mut game, 42.0);
        run_ticks(&mut game, 30, DT);
        slide(&mut game, 58.0);
        let events = run_ticks(&mut game, 30, DT);
        assert_eq!(count_completions(&events), 1);
    }

    #[test]
    fn slider_is_clamped() {
        let mut game = game_with(&GameConfig::new());
        slide(&mut game, 250.0);
        assert_eq!(game.state.value, SLIDER_MAX);
        slide(&mut game, f32::NAN);
        assert_eq!(game.state.value, SLIDER_MAX);
    }

    #[test]
    fn contract_completion_fires_at_most_once() {
        let mut game = game_with(&GameConfig::new());
        let script = [
            GameInput::SliderChanged { value: 50.0 },
            GameInput::PointerDown { x: 0.0, y: 0.0 },
        ];
        test_helpers::contract_completion_fires_at_most_once(&mut game, &script, 70);
        test_helpers::contract_solved_game_ignores_input(&mut game);
    }

    #[test]
    fn contract_init_tolerates_empty_config() {
        test_helpers::contract_init_tolerates_empty_config(&mut LockpickGame::new());
    }

    #[test]
    fn contract_init_tolerates_malformed_config() {
        test_helpers::contract_init_tolerates_malformed_config(
            &mut LockpickGame::new(),
            &["holdMs", "band_min", "band_max"],
        );
    }

    #[test]
    fn contract_teardown_cancels_timers() {
        let mut game = game_with(&GameConfig::new());
        press(&mut game);
        run_ticks(&mut game, 20, DT);
        let held = game.state.held_secs;
        assert!(held > 0.0);
        // Mid-hold teardown: the hold never reaches hold_ms
        test_helpers::contract_teardown_cancels_timers(&mut game);
        assert_eq!(game.state.held_secs, held);
        assert_eq!(game.state.phase, GamePhase::Playing);
    }

    #[test]
    fn contract_state_roundtrip_preserves() {
        let mut game = game_with(&GameConfig::new());
        press(&mut game);
        run_ticks(&mut game, 12, DT);
        test_helpers::contract_state_roundtrip_preserves(&mut game);
    }

    #[test]
    fn contract_pause_stops_updates() {
        let mut game = game_with(&GameConfig::new());
        press(&mut game);
        test_helpers::contract_pause_stops_updates(
            &mut game,
            &GameInput::SliderChanged { value: 90.0 },
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn slider_wiggle_completes_at_most_once(
                moves in proptest::collection::vec((0.0f32..=100.0, 1usize..30), 1..60)
            ) {
                let mut game = game_with(&GameConfig::new());
                press(&mut game);
                let mut completions = 0;
                for (value, ticks) in moves {
                    completions += count_completions(&slide(&mut game, value));
                    completions += count_completions(&run_ticks(&mut game, ticks, DT));
                    prop_assert!(game.state.held_secs == 0.0 || game.config.in_band(game.state.value)
                        || game.state.phase == GamePhase::Solved);
                }
                prop_assert!(completions <= 1);
            }
        }
    }
}
