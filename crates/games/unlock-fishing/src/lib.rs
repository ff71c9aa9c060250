pub mod pond;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use unlock_core::completion::CompletionLatch;
use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{
    GameConfig, GameEvent, GameInput, GameMetadata, GamePhase, GameResult, UnlockGame,
};
use unlock_core::timers::TimerSet;
use unlock_core::unlock_game_boilerplate;

use pond::{POND_HEIGHT, POND_WIDTH, Pond};

/// How long a feedback toast stays up (seconds).
const TOAST_SECS: f32 = 0.9;
/// Delay between the catch and the completion signal (seconds).
const REVEAL_DELAY_SECS: f32 = 1.2;

/// Tunable options, read from the invite's game config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FishingConfig {
    pub attempts: u32,
    /// Extra reach added around the hook hitbox.
    pub padding: f32,
    /// How far the hook drops (logical units).
    pub drop_depth: f32,
    /// Duration of the drop, and of the return (seconds).
    pub drop_secs: f32,
    /// Hook sway amplitude as a fraction of half the pond width.
    pub sway: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for FishingConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            padding: 12.0,
            drop_depth: 180.0,
            drop_secs: 0.38,
            sway: 0.38,
            width: POND_WIDTH,
            height: POND_HEIGHT,
        }
    }
}

impl FishingConfig {
    pub fn from_game_config(config: &GameConfig) -> Self {
        let d = Self::default();
        Self {
            attempts: config.u32_or(&["attempts"], d.attempts).max(1),
            padding: config.f32_or(&["padding"], d.padding).max(0.0),
            drop_depth: config
                .f32_or(&["drop_depth", "dropDepth"], d.drop_depth)
                .max(0.0),
            drop_secs: config
                .f32_or(&["drop_secs", "dropSecs"], d.drop_secs)
                .max(0.01),
            sway: config.f32_or(&["sway"], d.sway).clamp(0.0, 1.0),
            width: positive_or(config.f32_or(&["width"], d.width), d.width),
            height: positive_or(config.f32_or(&["height"], d.height), d.height),
        }
    }
}

fn positive_or(v: f32, fallback: f32) -> f32 {
    if v > 0.0 { v } else { fallback }
}

/// Where the hook is in its drop cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HookState {
    Swaying,
    /// Falling at a frozen horizontal offset.
    Dropping { offset: f32 },
    /// Reeling back after a miss; drops are ignored until it is up.
    Returning { offset: f32 },
    /// Stays down with the catch.
    Landed { offset: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FishingTimer {
    DropLand,
    HookReturn,
    ToastClear,
    Reveal,
}

/// Serializable game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FishingState {
    /// Seconds since init; drives fish and sway animation.
    pub clock: f32,
    pub hook: HookState,
    pub attempts_left: u32,
    pub caught_fish: Option<usize>,
    pub toast: Option<String>,
    pub phase: GamePhase,
    pub completion: CompletionLatch,
    pub timers: TimerSet<FishingTimer>,
}

impl FishingState {
    fn new(attempts: u32) -> Self {
        Self {
            clock: 0.0,
            hook: HookState::Swaying,
            attempts_left: attempts,
            caught_fish: None,
            toast: None,
            phase: GamePhase::Playing,
            completion: CompletionLatch::new(),
            timers: TimerSet::new(),
        }
    }
}

/// Drop the hook onto a passing fish. Limited attempts, no recovery once
/// they run out.
pub struct FishingGame {
    config: FishingConfig,
    pond: Pond,
    state: FishingState,
    paused: bool,
    torn_down: bool,
}

impl FishingGame {
    pub fn new() -> Self {
        let config = FishingConfig::default();
        Self {
            pond: Pond::new(config.width, config.height, config.sway),
            state: FishingState::new(config.attempts),
            config,
            paused: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &FishingState {
        &self.state
    }

    pub fn pond(&self) -> &Pond {
        &self.pond
    }

    pub fn config(&self) -> &FishingConfig {
        &self.config
    }

    /// Current vertical drop of the hook, for rendering.
    pub fn hook_drop(&self) -> f32 {
        match self.state.hook {
            HookState::Swaying => 0.0,
            HookState::Dropping { .. } => {
                let left = self
                    .state
                    .timers
                    .remaining(FishingTimer::DropLand)
                    .unwrap_or(0.0);
                let t = (1.0 - left / self.config.drop_secs).clamp(0.0, 1.0);
                // Ease-in fall
                self.config.drop_depth * t * t
            },
            HookState::Returning { .. } => {
                let left = self
                    .state
                    .timers
                    .remaining(FishingTimer::HookReturn)
                    .unwrap_or(0.0);
                self.config.drop_depth * (left / self.config.drop_secs).clamp(0.0, 1.0)
            },
            HookState::Landed { .. } => self.config.drop_depth,
        }
    }

    fn show_toast(&mut self, message: &str, events: &mut Vec<GameEvent>) {
        self.state.toast = Some(message.to_string());
        self.state.timers.schedule(FishingTimer::ToastClear, TOAST_SECS);
        events.push(GameEvent::Feedback {
            message: message.to_string(),
        });
    }

    fn drop_hook(&mut self) {
        let offset = self.pond.hook_offset(self.state.clock);
        self.state.hook = HookState::Dropping { offset };
        self.state.toast = None;
        self.state.timers.cancel(FishingTimer::ToastClear);
        self.state
            .timers
            .schedule(FishingTimer::DropLand, self.config.drop_secs);
    }

    /// Hit-test at the instant the drop animation ends.
    fn resolve_drop(&mut self, events: &mut Vec<GameEvent>) {
        let HookState::Dropping { offset } = self.state.hook else {
            return;
        };
        if self.state.phase != GamePhase::Playing {
            return;
        }

        let hit = self.pond.catch_at(
            self.state.clock,
            offset,
            self.config.drop_depth,
            self.config.padding,
        );

        if let Some(fish) = hit {
            self.state.hook = HookState::Landed { offset };
            self.state.caught_fish = Some(fish);
            self.state.phase = GamePhase::Solved;
            self.show_toast("Nice catch!", events);
            self.state
                .timers
                .schedule(FishingTimer::Reveal, REVEAL_DELAY_SECS);
            tracing::debug!(fish, attempts_left = self.state.attempts_left, "Fish caught");
            return;
        }

        self.state.attempts_left = self.state.attempts_left.saturating_sub(1);
        self.show_toast("Miss!", events);
        events.push(GameEvent::AttemptsChanged {
            remaining: self.state.attempts_left,
        });

        if self.state.attempts_left == 0 {
            self.state.phase = GamePhase::Exhausted;
            self.state.hook = HookState::Swaying;
            events.push(GameEvent::Exhausted);
            tracing::debug!("No attempts left");
        } else {
            self.state.hook = HookState::Returning { offset };
            self.state
                .timers
                .schedule(FishingTimer::HookReturn, self.config.drop_secs);
        }
    }

    fn reveal(&mut self, events: &mut Vec<GameEvent>) {
        let used = self.config.attempts.saturating_sub(self.state.attempts_left) + 1;
        let mut result = GameResult::new(GameTypeId::Fishing, "Nice catch!")
            .with_meta("attempts_used", used);
        if let Some(fish) = self.state.caught_fish {
            result = result.with_meta("fish", fish);
        }
        events.extend(self.state.completion.fire(Some(result)));
    }
}

impl Default for FishingGame {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockGame for FishingGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Fishing".to_string(),
            description: "Drop the hook on a moving fish to reel in the invite.".to_string(),
            estimated_duration: Duration::from_secs(20),
        }
    }

    fn game_type(&self) -> GameTypeId {
        GameTypeId::Fishing
    }

    fn init(&mut self, config: &GameConfig) {
        self.config = FishingConfig::from_game_config(config);
        self.pond = Pond::new(self.config.width, self.config.height, self.config.sway);
        self.state = FishingState::new(self.config.attempts);
        self.paused = false;
        self.torn_down = false;
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused {
            return Vec::new();
        }
        self.state.clock += dt;

        let mut events = Vec::new();
        for timer in self.state.timers.advance(dt) {
            match timer {
                FishingTimer::DropLand => self.resolve_drop(&mut events),
                FishingTimer::HookReturn => {
                    if matches!(self.state.hook, HookState::Returning { .. }) {
                        self.state.hook = HookState::Swaying;
                    }
                },
                FishingTimer::ToastClear => self.state.toast = None,
                FishingTimer::Reveal => self.reveal(&mut events),
            }
        }
        events
    }

    fn apply_input(&mut self, input: &GameInput) -> Vec<GameEvent> {
        if self.paused || self.state.phase != GamePhase::Playing {
            return Vec::new();
        }
        match input {
            GameInput::Tap | GameInput::PointerDown { .. } => {
                if self.state.hook == HookState::Swaying {
                    self.drop_hook();
                }
            },
            _ => {},
        }
        Vec::new()
    }

    unlock_game_boilerplate!(state_type: FishingState);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use unlock_core::test_helpers::{self, config, count_completions, run_ticks};

    const DT: f32 = 1.0 / 60.0;

    fn game_with(cfg: &GameConfig) -> FishingGame {
        let mut game = FishingGame::new();
        game.init(cfg);
        game
    }

    fn still_hook() -> GameConfig {
        config(&[("sway", json!(0.0))])
    }

    /// Tick until a drop started now would land on a fish throughout the
    /// window in which the landing tick can fall.
    fn wait_for_catchable(game: &mut FishingGame) {
        let depth = game.config.drop_depth;
        let pad = game.config.padding;
        for _ in 0..2000 {
            let t = game.state.clock;
            let offset = game.pond.hook_offset(t);
            let early = game.pond.catch_at(t + 0.35, offset, depth, pad);
            let late = game.pond.catch_at(t + 0.45, offset, depth, pad);
            if early.is_some() && late.is_some() {
                return;
            }
            game.update(DT);
        }
        panic!("no catchable window found");
    }

    fn catch_fish(game: &mut FishingGame) -> Vec<GameEvent> {
        wait_for_catchable(game);
        let mut events = game.apply_input(&GameInput::Tap);
        events.extend(run_ticks(game, 30, DT));
        events
    }

    #[test]
    fn defaults_from_empty_config() {
        let game = game_with(&GameConfig::new());
        assert_eq!(game.config, FishingConfig::default());
        assert_eq!(game.state.attempts_left, 3);
    }

    #[test]
    fn config_overrides_and_clamps() {
        let game = game_with(&config(&[
            ("attempts", json!(0)),
            ("padding", json!(-4)),
            ("sway", json!(3.0)),
            ("width", json!("wide")),
        ]));
        assert_eq!(game.config.attempts, 1);
        assert_eq!(game.config.padding, 0.0);
        assert_eq!(game.config.sway, 1.0);
        assert_eq!(game.config.width, POND_WIDTH);
    }

    #[test]
    fn drop_on_fish_solves_and_completes_after_delay() {
        let mut game = game_with(&still_hook());
        let events = catch_fish(&mut game);

        assert_eq!(game.state.phase, GamePhase::Solved);
        assert!(game.state.caught_fish.is_some());
        assert_eq!(game.state.attempts_left, 3);
        assert!(events.iter().any(
            |e| matches!(e, GameEvent::Feedback { message } if message == "Nice catch!")
        ));
        // Reveal delay has not elapsed yet
        assert_eq!(count_completions(&events), 0);

        let later = run_ticks(&mut game, 90, DT);
        assert_eq!(count_completions(&later), 1);
        match later.iter().find(|e| e.is_completed()) {
            Some(GameEvent::Completed { result: Some(r) }) => {
                assert_eq!(r.game, GameTypeId::Fishing);
                assert_eq!(r.meta.get("attempts_used"), Some(&json!(1)));
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn padding_extends_reach() {
        // At this depth the bare hook stops just above the top lane
        let pond = Pond::new(POND_WIDTH, POND_HEIGHT, 0.0);
        let depth = 10.0;
        let reachable = |pad: f32| {
            (0..2000).any(|i| pond.catch_at(i as f32 * 0.01, 0.0, depth, pad).is_some())
        };
        assert!(!reachable(0.0));
        assert!(reachable(12.0));
    }

    #[test]
    fn miss_decrements_exactly_one_attempt() {
        let mut game = game_with(&config(&[("drop_depth", json!(0))]));
        let mut events = game.apply_input(&GameInput::Tap);
        events.extend(run_ticks(&mut game, 30, DT));

        assert_eq!(game.state.attempts_left, 2);
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::AttemptsChanged { .. }))
                .count(),
            1
        );
        assert_eq!(game.state.phase, GamePhase::Playing);
    }

    #[test]
    fn taps_while_hook_is_busy_are_ignored() {
        let mut game = game_with(&config(&[("drop_depth", json!(0))]));
        game.apply_input(&GameInput::Tap);
        game.apply_input(&GameInput::Tap);
        run_ticks(&mut game, 25, DT);
        // Returning: still busy
        game.apply_input(&GameInput::Tap);
        run_ticks(&mut game, 60, DT);
        assert_eq!(game.state.attempts_left, 2);
    }

    #[test]
    fn exhausting_attempts_is_terminal_without_completion() {
        let mut game = game_with(&config(&[("drop_depth", json!(0)), ("attempts", json!(2))]));
        let mut events = Vec::new();
        for _ in 0..5 {
            events.extend(game.apply_input(&GameInput::Tap));
            events.extend(run_ticks(&mut game, 60, DT));
        }

        assert_eq!(game.state.phase, GamePhase::Exhausted);
        assert_eq!(game.state.attempts_left, 0);
        assert_eq!(events.iter().filter(|e| matches!(e, GameEvent::Exhausted)).count(), 1);
        assert_eq!(count_completions(&events), 0);
        assert!(!game.has_completed());

        // Stays exhausted
        events = game.apply_input(&GameInput::Tap);
        events.extend(run_ticks(&mut game, 120, DT));
        assert!(events.is_empty());
    }

    #[test]
    fn teardown_before_reveal_suppresses_completion() {
        let mut game = game_with(&still_hook());
        catch_fish(&mut game);
        assert!(game.state.timers.is_pending(FishingTimer::Reveal));
        test_helpers::contract_teardown_cancels_timers(&mut game);
        assert!(!game.has_completed());
    }

    #[test]
    fn teardown_mid_drop_never_lands() {
        let mut game = game_with(&still_hook());
        wait_for_catchable(&mut game);
        game.apply_input(&GameInput::Tap);
        assert!(game.state.timers.is_pending(FishingTimer::DropLand));
        test_helpers::contract_teardown_cancels_timers(&mut game);
        assert!(matches!(game.state.hook, HookState::Dropping { .. }));
        assert_eq!(game.state.attempts_left, 3);
    }

    #[test]
    fn completes_once_under_repeated_taps() {
        let mut game = game_with(&still_hook());
        let mut events = catch_fish(&mut game);
        for _ in 0..20 {
            events.extend(game.apply_input(&GameInput::Tap));
            events.extend(run_ticks(&mut game, 10, DT));
        }
        assert_eq!(count_completions(&events), 1);
        test_helpers::contract_solved_game_ignores_input(&mut game);
    }

    #[test]
    fn toast_clears() {
        let mut game = game_with(&config(&[("drop_depth", json!(0))]));
        game.apply_input(&GameInput::Tap);
        run_ticks(&mut game, 25, DT);
        assert_eq!(game.state.toast.as_deref(), Some("Miss!"));
        run_ticks(&mut game, 60, DT);
        assert_eq!(game.state.toast, None);
    }

    #[test]
    fn hook_drop_animates() {
        let mut game = game_with(&still_hook());
        assert_eq!(game.hook_drop(), 0.0);
        game.apply_input(&GameInput::Tap);
        run_ticks(&mut game, 12, DT);
        let mid = game.hook_drop();
        assert!(mid > 0.0 && mid < game.config.drop_depth);
    }

    #[test]
    fn contract_init_tolerates_empty_config() {
        test_helpers::contract_init_tolerates_empty_config(&mut FishingGame::new());
    }

    #[test]
    fn contract_init_tolerates_malformed_config() {
        test_helpers::contract_init_tolerates_malformed_config(
            &mut FishingGame::new(),
            &["attempts", "padding", "drop_depth", "sway", "width"],
        );
    }

    #[test]
    fn contract_state_roundtrip_preserves() {
        let mut game = game_with(&GameConfig::new());
        game.apply_input(&GameInput::Tap);
        run_ticks(&mut game, 5, DT);
        test_helpers::contract_state_roundtrip_preserves(&mut game);
    }

    #[test]
    fn contract_pause_stops_updates() {
        let mut game = game_with(&GameConfig::new());
        test_helpers::contract_pause_stops_updates(&mut game, &GameInput::Tap);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn random_taps_complete_at_most_once(
                attempts in 1u32..5,
                taps in proptest::collection::vec(any::<bool>(), 1..600)
            ) {
                let mut game = game_with(&config(&[("attempts", json!(attempts))]));
                let mut completions = 0;
                let mut last_attempts = attempts;
                for tap in taps {
                    if tap {
                        completions += count_completions(&game.apply_input(&GameInput::Tap));
                    }
                    completions += count_completions(&game.update(DT));
                    prop_assert!(game.state.attempts_left <= last_attempts);
                    last_attempts = game.state.attempts_left;
                }
                completions += count_completions(&run_ticks(&mut game, 120, DT));
                prop_assert!(completions <= 1);
                prop_assert_eq!(completions == 1, game.state.phase == GamePhase::Solved);
                if game.state.phase == GamePhase::Exhausted {
                    prop_assert_eq!(game.state.attempts_left, 0);
                }
            }
        }
    }
}
