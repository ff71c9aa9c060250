pub mod completion;
pub mod game_registry;
pub mod game_trait;
pub mod geometry;
pub mod time;
pub mod timers;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use serde_json::Value;

    use crate::game_trait::{GameConfig, GameEvent, GameInput, GamePhase, UnlockGame};

    /// Build a config from key/value pairs.
    pub fn config(pairs: &[(&str, Value)]) -> GameConfig {
        pairs
            .iter()
            .fold(GameConfig::new(), |cfg, (k, v)| cfg.with(k, v.clone()))
    }

    /// Run N frame ticks, returning all accumulated events.
    pub fn run_ticks(game: &mut dyn UnlockGame, n: usize, dt: f32) -> Vec<GameEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(game.update(dt));
        }
        all_events
    }

    /// Apply each input followed by `ticks_between` frame ticks.
    pub fn play_script(
        game: &mut dyn UnlockGame,
        script: &[GameInput],
        ticks_between: usize,
        dt: f32,
    ) -> Vec<GameEvent> {
        let mut all_events = Vec::new();
        for input in script {
            all_events.extend(game.apply_input(input));
            all_events.extend(run_ticks(game, ticks_between, dt));
        }
        all_events
    }

    pub fn count_completions(events: &[GameEvent]) -> usize {
        events.iter().filter(|e| e.is_completed()).count()
    }

    // ================================================================
    // Game Contract Tests
    // ================================================================
    // Every UnlockGame implementation must pass these. Game crates call
    // them from their own #[cfg(test)] modules with a concrete instance
    // and, where needed, a winning input script.

    /// init() with an empty config must produce a playable, incomplete game.
    pub fn contract_init_tolerates_empty_config(game: &mut dyn UnlockGame) {
        game.init(&GameConfig::new());
        assert_eq!(game.phase(), GamePhase::Playing);
        assert!(!game.has_completed());
        assert!(
            !game.serialize_state().is_empty(),
            "serialize_state() must return non-empty bytes after init"
        );
    }

    /// init() with garbage values for the given keys must not panic and must
    /// leave the game playable.
    pub fn contract_init_tolerates_malformed_config(game: &mut dyn UnlockGame, keys: &[&str]) {
        let mut cfg = GameConfig::new();
        for (i, key) in keys.iter().enumerate() {
            let junk = match i % 3 {
                0 => Value::String("not a number".to_string()),
                1 => Value::Bool(true),
                _ => serde_json::json!({"nested": [1, 2]}),
            };
            cfg = cfg.with(key, junk);
        }
        game.init(&cfg);
        assert_eq!(game.phase(), GamePhase::Playing);
        let _ = run_ticks(game, 10, 1.0 / 60.0);
    }

    /// The winning script completes the game exactly once, and replaying it
    /// (plus extra ticks) never fires a second completion.
    pub fn contract_completion_fires_at_most_once(
        game: &mut dyn UnlockGame,
        winning_script: &[GameInput],
        ticks_between: usize,
    ) {
        let dt = 1.0 / 60.0;
        let mut events = play_script(game, winning_script, ticks_between, dt);
        events.extend(run_ticks(game, 240, dt));
        assert_eq!(
            count_completions(&events),
            1,
            "winning script must complete exactly once, got {events:?}"
        );
        assert!(game.has_completed());

        let mut again = play_script(game, winning_script, ticks_between, dt);
        again.extend(run_ticks(game, 240, dt));
        assert_eq!(
            count_completions(&again),
            0,
            "completed game must not complete again"
        );
    }

    /// teardown() must cancel every pending timer and freeze the instance:
    /// no later input, tick, or resume() changes state or completes it.
    pub fn contract_teardown_cancels_timers(game: &mut dyn UnlockGame) {
        let was_completed = game.has_completed();
        game.teardown();
        assert_eq!(game.pending_timers(), 0, "teardown must cancel all timers");
        game.resume();

        let before = game.serialize_state();
        let inputs = [
            GameInput::Tap,
            GameInput::PointerDown { x: 10.0, y: 10.0 },
            GameInput::PointerMove { x: 50.0, y: 50.0 },
            GameInput::PointerUp,
            GameInput::SliderChanged { value: 50.0 },
            GameInput::Select { index: 0 },
        ];
        let mut events = play_script(game, &inputs, 5, 1.0 / 60.0);
        events.extend(run_ticks(game, 1200, 1.0 / 60.0));
        assert!(events.is_empty(), "torn-down game emitted {events:?}");
        assert_eq!(before, game.serialize_state(), "torn-down game must not change");
        assert_eq!(game.has_completed(), was_completed);
    }

    /// serialize_state -> apply_state must be stable after one roundtrip.
    pub fn contract_state_roundtrip_preserves(game: &mut dyn UnlockGame) {
        let state_a = game.serialize_state();
        game.apply_state(&state_a);
        let state_b = game.serialize_state();
        game.apply_state(&state_b);
        let state_c = game.serialize_state();
        assert_eq!(
            state_b, state_c,
            "State must be stable after serialize→apply→serialize roundtrip"
        );
    }

    /// pause() must freeze state; input while paused is ignored.
    pub fn contract_pause_stops_updates(game: &mut dyn UnlockGame, input: &GameInput) {
        game.pause();
        let before = game.serialize_state();
        game.apply_input(input);
        game.update(1.0);
        let during_pause = game.serialize_state();
        assert_eq!(before, during_pause, "State must not change while paused");
        game.resume();
    }

    /// A solved game ignores every kind of input.
    pub fn contract_solved_game_ignores_input(game: &mut dyn UnlockGame) {
        assert_eq!(game.phase(), GamePhase::Solved);
        let inputs = [
            GameInput::Tap,
            GameInput::PointerDown { x: 10.0, y: 10.0 },
            GameInput::PointerMove { x: 50.0, y: 50.0 },
            GameInput::PointerUp,
            GameInput::SliderChanged { value: 50.0 },
            GameInput::Select { index: 0 },
            GameInput::Reset,
        ];
        let events = play_script(game, &inputs, 5, 1.0 / 60.0);
        assert_eq!(count_completions(&events), 0);
        assert_eq!(game.phase(), GamePhase::Solved);
    }
}
