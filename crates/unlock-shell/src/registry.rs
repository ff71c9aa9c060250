use std::sync::LazyLock;

use serde::Serialize;
use serde_json::json;

use unlock_core::game_registry::GameTypeId;
use unlock_core::game_trait::{GameConfig, UnlockGame};

/// Factory for a fresh, uninitialized game instance.
pub type GameFactory = fn() -> Box<dyn UnlockGame>;

/// Immutable description of one game type.
#[derive(Clone, Serialize)]
pub struct GameRegistryEntry {
    pub id: GameTypeId,
    pub display_name: &'static str,
    pub description: &'static str,
    pub default_config: GameConfig,
    #[serde(skip)]
    pub factory: GameFactory,
    /// Preview image shown in the game picker.
    pub preview: Option<&'static str>,
}

impl std::fmt::Debug for GameRegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameRegistryEntry")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("default_config", &self.default_config)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

impl GameRegistryEntry {
    /// A fresh instance, initialized with `config` layered over the defaults.
    pub fn instantiate(&self, config: &GameConfig) -> Box<dyn UnlockGame> {
        let mut game = (self.factory)();
        game.init(&self.default_config.merged(config));
        game
    }
}

/// Static table of every game type, built once on first use.
pub struct GameRegistry {
    entries: Vec<GameRegistryEntry>,
}

static REGISTRY: LazyLock<GameRegistry> = LazyLock::new(GameRegistry::build);

/// The process-wide registry.
pub fn registry() -> &'static GameRegistry {
    &REGISTRY
}

impl GameRegistry {
    fn build() -> Self {
        let entries: Vec<GameRegistryEntry> = vec![
            GameRegistryEntry {
                id: GameTypeId::Fishing,
                display_name: "Fishing",
                description: "Tap a moving fish to hook the invite.",
                default_config: GameConfig::new().with("attempts", 3),
                factory: || Box::new(unlock_fishing::FishingGame::new()),
                preview: Some("previews/fishing.png"),
            },
            GameRegistryEntry {
                id: GameTypeId::Scratch,
                display_name: "Scratch",
                description: "Scratch away to reveal dinner.",
                default_config: GameConfig::new().with("threshold", 0.65),
                factory: || Box::new(unlock_scratch::ScratchGame::new()),
                preview: Some("previews/scratch.png"),
            },
            GameRegistryEntry {
                id: GameTypeId::Pour,
                display_name: "Split the G",
                description: "Hold to fill the glass just right.",
                // Band stays with the game so stored legacy min/max still apply
                default_config: GameConfig::new().with("fill_rate", 50),
                factory: || Box::new(unlock_pour::PourGame::new()),
                preview: Some("previews/pour.png"),
            },
            GameRegistryEntry {
                id: GameTypeId::Lockpick,
                display_name: "Lockpick",
                description: "Hold the slider in the sweet spot.",
                default_config: GameConfig::new().with("holdMs", 900),
                factory: || Box::new(unlock_lockpick::LockpickGame::new()),
                preview: None,
            },
            GameRegistryEntry {
                id: GameTypeId::Wheel,
                display_name: "Wheel",
                description: "Spin the wheel to open the invite.",
                default_config: GameConfig::new().with("spin_ms", 3000),
                factory: || Box::new(unlock_wheel::WheelGame::new()),
                preview: None,
            },
            GameRegistryEntry {
                id: GameTypeId::Runner,
                display_name: "Dino runner",
                description: "Jump the cacti to unlock the invite.",
                default_config: GameConfig::new()
                    .with("win_score", 250)
                    .with("unlock_on_game_over", true),
                factory: || Box::new(unlock_runner::RunnerGame::new()),
                preview: Some("previews/runner.png"),
            },
            GameRegistryEntry {
                id: GameTypeId::Memory,
                display_name: "Memory",
                description: "Match the cards to unlock.",
                default_config: GameConfig::from_json(&json!({ "pairs": 2 })),
                factory: || Box::new(unlock_memory::MemoryGame::new()),
                preview: None,
            },
        ];
        debug_assert!(
            entries.iter().enumerate().all(|(i, e)| e.id.index() == i),
            "registry entries must follow GameTypeId::ALL order"
        );
        tracing::debug!(games = entries.len(), "Game registry built");
        Self { entries }
    }

    /// Total over the closed id set.
    pub fn lookup(&self, id: GameTypeId) -> &GameRegistryEntry {
        &self.entries[id.index()]
    }

    /// Lookup by stored identifier; unknown or absent ids get the default
    /// game.
    pub fn lookup_str(&self, raw: Option<&str>) -> &GameRegistryEntry {
        self.lookup(GameTypeId::resolve(raw))
    }

    /// Every entry, in declaration order.
    pub fn entries(&self) -> &[GameRegistryEntry] {
        &self.entries
    }

    /// An initialized instance: registry defaults, then `overrides` (shell
    /// config), then the invite's stored config.
    pub fn create(
        &self,
        id: GameTypeId,
        overrides: &GameConfig,
        stored: &GameConfig,
    ) -> Box<dyn UnlockGame> {
        self.lookup(id).instantiate(&overrides.merged(stored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unlock_core::game_trait::GamePhase;

    #[test]
    fn every_id_has_an_entry() {
        let reg = registry();
        assert_eq!(reg.entries().len(), GameTypeId::ALL.len());
        for id in GameTypeId::ALL {
            let entry = reg.lookup(id);
            assert_eq!(entry.id, id);
            assert!(!entry.display_name.is_empty());
            assert!(!entry.default_config.is_empty());
        }
    }

    #[test]
    fn factories_build_matching_games() {
        for entry in registry().entries() {
            let game = entry.instantiate(&GameConfig::new());
            assert_eq!(game.game_type(), entry.id);
            assert_eq!(game.phase(), GamePhase::Playing);
            assert!(!game.has_completed());
        }
    }

    #[test]
    fn unknown_and_missing_fall_back_to_fishing() {
        let reg = registry();
        assert_eq!(reg.lookup_str(Some("bowling")).id, GameTypeId::Fishing);
        assert_eq!(reg.lookup_str(None).id, GameTypeId::Fishing);
        assert_eq!(reg.lookup_str(Some("pour")).id, GameTypeId::Pour);
    }

    #[test]
    fn entry_serializes_without_factory() {
        let v = serde_json::to_value(registry().lookup(GameTypeId::Pour)).unwrap();
        assert_eq!(v["id"], "pour");
        assert_eq!(v["display_name"], "Split the G");
        assert_eq!(v["default_config"]["fill_rate"], 50);
        assert!(v["default_config"].get("target").is_none());
        assert!(v.get("factory").is_none());
    }
}
