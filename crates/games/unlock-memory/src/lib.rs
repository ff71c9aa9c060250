use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use unlock_core::completion::CompletionLatch;
use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{
    GameConfig, GameEvent, GameInput, GameMetadata, GamePhase, GameResult, UnlockGame,
};
use unlock_core::timers::TimerSet;
use unlock_core::unlock_game_boilerplate;

/// A matched pair stays face up this long before play continues (seconds).
const SETTLE_SECS: f32 = 0.5;
/// A mismatched pair is shown this long before flipping back (seconds).
const FLIP_BACK_SECS: f32 = 0.7;
const MAX_PAIRS: u32 = 26;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    pub pairs: u32,
    /// Face values; letters when not configured.
    pub icons: Vec<String>,
    pub seed: Option<u64>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            pairs: 2,
            icons: Vec::new(),
            seed: None,
        }
    }
}

impl MemoryConfig {
    pub fn from_game_config(config: &GameConfig) -> Self {
        let d = Self::default();
        Self {
            pairs: config.u32_or(&["pairs"], d.pairs).clamp(1, MAX_PAIRS),
            icons: config
                .read::<Vec<String>>(&["icons"])
                .unwrap_or_default(),
            seed: config.u64_opt(&["seed"]),
        }
    }

    /// One face value per pair. Configured icons are used first, then
    /// letters fill the rest.
    fn faces(&self) -> Vec<String> {
        let mut faces: Vec<String> = self
            .icons
            .iter()
            .filter(|s| !s.trim().is_empty())
            .take(self.pairs as usize)
            .cloned()
            .collect();
        let mut letters = ('A'..='Z').map(String::from);
        while faces.len() < self.pairs as usize {
            match letters.next() {
                Some(l) if !faces.contains(&l) => faces.push(l),
                Some(_) => {},
                None => break,
            }
        }
        faces
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub value: String,
    pub matched: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryTimer {
    Settle,
    FlipBack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryState {
    pub cards: Vec<Card>,
    /// Face-up, unmatched-so-far cards of the current turn.
    pub flipped: Vec<usize>,
    pub moves: u32,
    pub phase: GamePhase,
    pub completion: CompletionLatch,
    pub timers: TimerSet<MemoryTimer>,
}

impl MemoryState {
    fn deal(config: &MemoryConfig, rng: &mut StdRng) -> Self {
        let mut cards: Vec<Card> = config
            .faces()
            .into_iter()
            .flat_map(|value| {
                [
                    Card {
                        value: value.clone(),
                        matched: false,
                    },
                    Card {
                        value,
                        matched: false,
                    },
                ]
            })
            .collect();
        cards.shuffle(rng);
        Self {
            cards,
            flipped: Vec::new(),
            moves: 0,
            phase: GamePhase::Playing,
            completion: CompletionLatch::new(),
            timers: TimerSet::new(),
        }
    }

    pub fn is_face_up(&self, index: usize) -> bool {
        self.flipped.contains(&index) || self.cards.get(index).is_some_and(|c| c.matched)
    }

    pub fn all_matched(&self) -> bool {
        self.cards.iter().all(|c| c.matched)
    }
}

/// Flip cards two at a time and match every pair.
pub struct MemoryGame {
    config: MemoryConfig,
    state: MemoryState,
    paused: bool,
    torn_down: bool,
}

impl MemoryGame {
    pub fn new() -> Self {
        let config = MemoryConfig::default();
        let mut rng = StdRng::seed_from_u64(rand::random());
        Self {
            state: MemoryState::deal(&config, &mut rng),
            config,
            paused: false,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &MemoryState {
        &self.state
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    fn flip(&mut self, index: usize) -> Vec<GameEvent> {
        if index >= self.state.cards.len()
            || self.state.is_face_up(index)
            || self.state.flipped.len() >= 2
        {
            return Vec::new();
        }
        self.state.flipped.push(index);
        let &[first, second] = self.state.flipped.as_slice() else {
            return Vec::new();
        };

        self.state.moves += 1;
        if self.state.cards[first].value == self.state.cards[second].value {
            self.state.cards[first].matched = true;
            self.state.cards[second].matched = true;
            self.state.timers.schedule(MemoryTimer::Settle, SETTLE_SECS);
            let matched = self.state.cards.iter().filter(|c| c.matched).count();
            tracing::trace!(first, second, matched, "Pair matched");
            vec![GameEvent::Progress {
                fraction: matched as f32 / self.state.cards.len() as f32,
            }]
        } else {
            self.state
                .timers
                .schedule(MemoryTimer::FlipBack, FLIP_BACK_SECS);
            Vec::new()
        }
    }
}

impl Default for MemoryGame {
    fn default() -> Self {
        Self::new()
    }
}

impl UnlockGame for MemoryGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Memory".to_string(),
            description: "Match the cards to unlock.".to_string(),
            estimated_duration: Duration::from_secs(15),
        }
    }

    fn game_type(&self) -> GameTypeId {
        GameTypeId::Memory
    }

    fn init(&mut self, config: &GameConfig) {
        self.config = MemoryConfig::from_game_config(config);
        let mut rng = StdRng::seed_from_u64(self.config.seed.unwrap_or_else(rand::random));
        self.state = MemoryState::deal(&self.config, &mut rng);
        self.paused = false;
        self.torn_down = false;
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused {
            return Vec::new();
        }
        let mut events = Vec::new();
        for timer in self.state.timers.advance(dt) {
            match timer {
                MemoryTimer::FlipBack => self.state.flipped.clear(),
                MemoryTimer::Settle => {
                    self.state.flipped.clear();
                    if self.state.all_matched() && self.state.phase == GamePhase::Playing {
                        self.state.phase = GamePhase::Solved;
                        tracing::debug!(moves = self.state.moves, "All pairs matched");
                        let result = GameResult::new(GameTypeId::Memory, "All matched")
                            .with_meta("moves", self.state.moves)
                            .with_meta("pairs", self.config.pairs);
                        events.extend(self.state.completion.fire(Some(result)));
                    }
                },
            }
        }
        events
    }

    fn apply_input(&mut self, input: &GameInput) -> Vec<GameEvent> {
        if self.paused || self.state.phase != GamePhase::Playing {
            return Vec::new();
        }
        match *input {
            GameInput::Select { index } => self.flip(index),
            _ => Vec::new(),
        }
    }

    unlock_game_boilerplate!(state_type: MemoryState);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use unlock_core::test_helpers::{self, config, count_completions, play_script, run_ticks};

    const DT: f32 = 1.0 / 60.0;

    fn seeded(seed: u64, pairs: u32) -> MemoryGame {
        let mut game = MemoryGame::new();
        game.init(&config(&[("seed", json!(seed)), ("pairs", json!(pairs))]));
        game
    }

    /// Select inputs that flip every pair in turn.
    fn solution(game: &MemoryGame) -> Vec<GameInput> {
        let cards = &game.state.cards;
        let mut script = Vec::new();
        let mut used = vec![false; cards.len()];
        for i in 0..cards.len() {
            if used[i] {
                continue;
            }
            let j = (i + 1..cards.len())
                .find(|&j| !used[j] && cards[j].value == cards[i].value)
                .unwrap();
            used[i] = true;
            used[j] = true;
            script.push(GameInput::Select { index: i });
            script.push(GameInput::Select { index: j });
        }
        script
    }

    /// Indices of two cards that do not match.
    fn mismatch(game: &MemoryGame) -> (usize, usize) {
        let cards = &game.state.cards;
        let j = (1..cards.len())
            .find(|&j| cards[j].value != cards[0].value)
            .unwrap();
        (0, j)
    }

    #[test]
    fn deals_pairs() {
        let game = seeded(1, 3);
        assert_eq!(game.state.cards.len(), 6);
        for face in ["A", "B", "C"] {
            assert_eq!(game.state.cards.iter().filter(|c| c.value == face).count(), 2);
        }
    }

    #[test]
    fn same_seed_same_layout() {
        assert_eq!(seeded(9, 4).state.cards, seeded(9, 4).state.cards);
    }

    #[test]
    fn configured_icons_are_used() {
        let mut game = MemoryGame::new();
        game.init(&config(&[
            ("pairs", json!(3)),
            ("icons", json!(["🍝", "🍷"])),
            ("seed", json!(1)),
        ]));
        let mut faces: Vec<&str> = game.state.cards.iter().map(|c| c.value.as_str()).collect();
        faces.sort();
        faces.dedup();
        assert_eq!(faces, vec!["A", "🍝", "🍷"]);
    }

    #[test]
    fn mismatch_flips_back() {
        let mut game = seeded(2, 2);
        let (a, b) = mismatch(&game);
        game.apply_input(&GameInput::Select { index: a });
        game.apply_input(&GameInput::Select { index: b });
        assert_eq!(game.state.flipped.len(), 2);
        run_ticks(&mut game, 36, DT);
        assert_eq!(game.state.flipped.len(), 2);
        run_ticks(&mut game, 10, DT);
        assert!(game.state.flipped.is_empty());
        assert_eq!(game.state.moves, 1);
    }

    #[test]
    fn third_flip_is_ignored() {
        let mut game = seeded(3, 3);
        let (a, b) = mismatch(&game);
        game.apply_input(&GameInput::Select { index: a });
        game.apply_input(&GameInput::Select { index: b });
        let third = (0..6).find(|i| *i != a && *i != b).unwrap();
        game.apply_input(&GameInput::Select { index: third });
        assert_eq!(game.state.flipped, vec![a, b]);
    }

    #[test]
    fn reselecting_face_up_card_is_ignored() {
        let mut game = seeded(3, 2);
        game.apply_input(&GameInput::Select { index: 0 });
        game.apply_input(&GameInput::Select { index: 0 });
        game.apply_input(&GameInput::Select { index: 99 });
        assert_eq!(game.state.flipped, vec![0]);
        assert_eq!(game.state.moves, 0);
    }

    #[test]
    fn matching_everything_completes_after_settle() {
        let mut game = seeded(4, 2);
        let script = solution(&game);
        let events = play_script(&mut game, &script, 40, DT);
        assert!(game.state.all_matched());
        assert_eq!(count_completions(&events), 1);
        assert_eq!(game.state.phase, GamePhase::Solved);
        match events.iter().find(|e| e.is_completed()) {
            Some(GameEvent::Completed { result: Some(r) }) => {
                assert_eq!(r.meta.get("moves"), Some(&json!(2)));
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn contract_completion_fires_at_most_once() {
        let mut game = seeded(5, 3);
        let script = solution(&game);
        test_helpers::contract_completion_fires_at_most_once(&mut game, &script, 50);
        test_helpers::contract_solved_game_ignores_input(&mut game);
    }

    #[test]
    fn contract_teardown_cancels_timers() {
        let mut game = seeded(6, 2);
        let (a, b) = mismatch(&game);
        game.apply_input(&GameInput::Select { index: a });
        game.apply_input(&GameInput::Select { index: b });
        test_helpers::contract_teardown_cancels_timers(&mut game);
        // Flip-back never happens once torn down
        assert_eq!(game.state.flipped.len(), 2);
    }

    #[test]
    fn contract_init_tolerates_empty_config() {
        test_helpers::contract_init_tolerates_empty_config(&mut MemoryGame::new());
    }

    #[test]
    fn contract_init_tolerates_malformed_config() {
        test_helpers::contract_init_tolerates_malformed_config(
            &mut MemoryGame::new(),
            &["pairs", "seed", "icons"],
        );
    }

    #[test]
    fn contract_state_roundtrip_preserves() {
        let mut game = seeded(7, 2);
        game.apply_input(&GameInput::Select { index: 1 });
        test_helpers::contract_state_roundtrip_preserves(&mut game);
    }

    #[test]
    fn contract_pause_stops_updates() {
        let mut game = seeded(7, 2);
        test_helpers::contract_pause_stops_updates(&mut game, &GameInput::Select { index: 0 });
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn random_selects_complete_at_most_once(
                seed in any::<u64>(),
                pairs in 1u32..5,
                picks in proptest::collection::vec((0usize..10, 0usize..60), 1..200)
            ) {
                let mut game = seeded(seed, pairs);
                let mut completions = 0;
                for (index, ticks) in picks {
                    completions += count_completions(
                        &game.apply_input(&GameInput::Select { index }),
                    );
                    completions += count_completions(&run_ticks(&mut game, ticks, DT));
                    prop_assert!(game.state.flipped.len() <= 2);
                }
                completions += count_completions(&run_ticks(&mut game, 60, DT));
                prop_assert!(completions <= 1);
                prop_assert_eq!(completions == 1, game.state.all_matched());
            }
        }
    }
}
